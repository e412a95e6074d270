//! Integration tests for the ble-autoconnect host-testable logic.
//!
//! Drives the public API the way the firmware does: GAP events in through
//! the dispatcher, host-stack calls out through a recording `HostStack`.

use ble_autoconnect::ble::adv_parser::parse_fields;
use ble_autoconnect::ble::dedup::DuplicateFilter;
use ble_autoconnect::config::{CONNECT_TIMEOUT_MS, TARGET_PEER_ADDRESS};
use ble_autoconnect::{
    Address, AddressKind, AdvEventKind, AdvertisementReport, ConnectionIntent, DiscoveryParams,
    EventDispatcher, EventStatus, GapEvent, HostStack, ScanConnectController, SessionState,
    StackError, StackOp, TargetConfiguration,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Infer,
    Start(AddressKind),
    Cancel,
    Connect(ConnectionIntent),
}

#[derive(Default)]
struct FakeStack {
    calls: Vec<Call>,
    cancel_rc: Option<u32>,
}

impl HostStack for FakeStack {
    fn infer_local_address_type(&mut self) -> Result<AddressKind, StackError> {
        self.calls.push(Call::Infer);
        Ok(AddressKind::Public)
    }

    fn start_discovery(
        &mut self,
        own_address_kind: AddressKind,
        _params: &DiscoveryParams,
    ) -> Result<(), StackError> {
        self.calls.push(Call::Start(own_address_kind));
        Ok(())
    }

    fn cancel_discovery(&mut self) -> Result<(), StackError> {
        self.calls.push(Call::Cancel);
        match self.cancel_rc {
            Some(rc) => Err(StackError::new(StackOp::CancelDiscovery, rc)),
            None => Ok(()),
        }
    }

    fn connect(&mut self, intent: &ConnectionIntent) -> Result<(), StackError> {
        self.calls.push(Call::Connect(*intent));
        Ok(())
    }
}

// Flags, complete local name "Sensor", manufacturer data.
const ADV_PAYLOAD: [u8; 15] = [
    0x02, 0x01, 0x06, //
    0x07, 0x09, b'S', b'e', b'n', b's', b'o', b'r', //
    0x03, 0xFF, 0x50, 0x06,
];

fn synced() -> EventDispatcher<FakeStack> {
    let target = TargetConfiguration::parse(TARGET_PEER_ADDRESS).unwrap();
    let mut dispatcher = EventDispatcher::new(ScanConnectController::new(target), FakeStack::default());
    assert_eq!(dispatcher.dispatch(&GapEvent::Sync), EventStatus::Handled);
    assert_eq!(dispatcher.session().state(), SessionState::Scanning);
    dispatcher.stack_mut().calls.clear();
    dispatcher
}

fn report_from(text: &str, kind: AdvEventKind) -> AdvertisementReport<'static> {
    AdvertisementReport::new(Address::parse(text).unwrap(), kind, &ADV_PAYLOAD).with_rssi(-61)
}

// ═══════════════════════════════════════════════════════════════════════════
// Scan → connect scenarios
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn target_advertisement_cancels_scan_then_connects() {
    let mut d = synced();
    let report = report_from("C8:47:80:1F:05:B6", AdvEventKind::ConnectableUndirected);

    d.dispatch(&GapEvent::Discovery(report));

    assert_eq!(
        d.stack().calls,
        vec![
            Call::Cancel,
            Call::Infer,
            Call::Connect(ConnectionIntent {
                own_address_kind: AddressKind::Public,
                peer: report.address,
                timeout_ms: CONNECT_TIMEOUT_MS,
            }),
        ]
    );
    assert_eq!(
        d.session().state(),
        SessionState::Connecting {
            peer: report.address
        }
    );
}

#[test]
fn other_device_leaves_scan_running() {
    let mut d = synced();
    d.dispatch(&GapEvent::Discovery(report_from(
        "11:22:33:44:55:66",
        AdvEventKind::ConnectableUndirected,
    )));

    assert!(d.stack().calls.is_empty());
    assert!(d.session().is_scanning());
}

#[test]
fn scannable_target_is_not_connected() {
    let mut d = synced();
    d.dispatch(&GapEvent::Discovery(report_from(
        TARGET_PEER_ADDRESS,
        AdvEventKind::ScannableUndirected,
    )));

    assert!(d.stack().calls.is_empty());
    assert!(d.session().is_scanning());
}

#[test]
fn cancel_refused_means_no_connect() {
    let mut d = synced();
    d.stack_mut().cancel_rc = Some(15);

    d.dispatch(&GapEvent::Discovery(report_from(
        TARGET_PEER_ADDRESS,
        AdvEventKind::ConnectableUndirected,
    )));

    assert_eq!(d.stack().calls, vec![Call::Cancel]);
    assert!(d.session().is_scanning());
}

#[test]
fn reports_after_match_are_ignored() {
    let mut d = synced();
    let report = report_from(TARGET_PEER_ADDRESS, AdvEventKind::ConnectableUndirected);

    d.dispatch(&GapEvent::Discovery(report));
    d.dispatch(&GapEvent::Discovery(report));

    let connects = d
        .stack()
        .calls
        .iter()
        .filter(|c| matches!(c, Call::Connect(_)))
        .count();
    assert_eq!(connects, 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Connection lifecycle
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn connect_timeout_is_terminal() {
    let mut d = synced();
    d.dispatch(&GapEvent::Discovery(report_from(
        TARGET_PEER_ADDRESS,
        AdvEventKind::ConnectableDirected,
    )));
    d.dispatch(&GapEvent::ConnectFailed { status: 13 });

    assert_eq!(d.session().state(), SessionState::Failed);

    // A late sync does not restart scanning from a terminal state.
    d.stack_mut().calls.clear();
    d.dispatch(&GapEvent::Sync);
    assert!(d.stack().calls.is_empty());
}

#[test]
fn established_link_then_disconnect() {
    let mut d = synced();
    d.dispatch(&GapEvent::Discovery(report_from(
        TARGET_PEER_ADDRESS,
        AdvEventKind::ConnectableUndirected,
    )));
    d.dispatch(&GapEvent::Connected { conn_handle: 3 });
    d.dispatch(&GapEvent::MtuUpdated {
        conn_handle: 3,
        mtu: 128,
    });
    assert_eq!(
        d.session().state(),
        SessionState::Connected { conn_handle: 3 }
    );

    d.dispatch(&GapEvent::Disconnected {
        conn_handle: 3,
        reason: 0x13,
    });
    assert_eq!(d.session().state(), SessionState::Disconnected);
}

#[test]
fn host_reset_rescans_on_next_sync() {
    let mut d = synced();
    d.dispatch(&GapEvent::Reset { reason: -1 });
    assert_eq!(d.session().state(), SessionState::Idle);

    d.dispatch(&GapEvent::Sync);
    assert_eq!(d.stack().calls, vec![Call::Infer, Call::Start(AddressKind::Public)]);
    assert!(d.session().is_scanning());
}

// ═══════════════════════════════════════════════════════════════════════════
// Building blocks used by the radio adapter
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn duplicate_filter_passes_target_once() {
    let mut seen = DuplicateFilter::<8>::new();
    let target = Address::parse(TARGET_PEER_ADDRESS).unwrap();

    assert!(seen.first_sighting(&target));
    assert!(!seen.first_sighting(&target.with_kind(AddressKind::RandomStatic)));
}

#[test]
fn advertised_name_is_decoded() {
    let fields = parse_fields(&ADV_PAYLOAD).unwrap();
    assert_eq!(fields.device_name().as_str(), "Sensor");
    assert_eq!(fields.flags, Some(0x06));
}

#[test]
fn target_with_one_byte_manufacturer_data_is_connected() {
    // Flags, manufacturer data holding a single byte.
    const SHORT_MFG: [u8; 6] = [0x02, 0x01, 0x06, 0x02, 0xFF, 0x4C];
    let mut d = synced();
    let report = AdvertisementReport::new(
        Address::parse(TARGET_PEER_ADDRESS).unwrap(),
        AdvEventKind::ConnectableUndirected,
        &SHORT_MFG,
    );

    d.dispatch(&GapEvent::Discovery(report));

    assert_eq!(
        d.session().state(),
        SessionState::Connecting {
            peer: report.address
        }
    );
}

#[test]
fn target_with_short_service_data_is_not_connected() {
    const SHORT_SERVICE_DATA: [u8; 3] = [0x02, 0x16, 0x0F];
    let mut d = synced();
    d.dispatch(&GapEvent::Discovery(AdvertisementReport::new(
        Address::parse(TARGET_PEER_ADDRESS).unwrap(),
        AdvEventKind::ConnectableUndirected,
        &SHORT_SERVICE_DATA,
    )));

    assert!(d.stack().calls.is_empty());
    assert!(d.session().is_scanning());
}

#[test]
fn target_address_displays_in_human_order() {
    let target = Address::parse("C8:47:80:1F:05:B6").unwrap();
    assert_eq!(target.to_string(), "c8:47:80:1f:05:b6");
    assert_eq!(target.bytes(), [0xB6, 0x05, 0x1F, 0x80, 0x47, 0xC8]);
}
