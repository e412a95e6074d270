//! SoftDevice S140 adapter for the scan → connect controller.
//!
//! The SoftDevice central API is closure/async based: `central::scan` runs
//! until its callback returns `Some`, and `central::connect` resolves once
//! the link is up or the attempt times out. [`SoftdeviceStack`] bridges that
//! model to the call-and-event [`HostStack`] contract: discovery and
//! connection requests are recorded and carried out by [`ble_task`], which
//! feeds every outcome back through the [`EventDispatcher`].

use core::{mem, slice};

use ble_autoconnect::ble::dedup::DuplicateFilter;
use ble_autoconnect::config::{
    ATT_MTU, DUPLICATE_FILTER_CAPACITY, HOST_SYNC_DELAY_MS, LINK_POLL_INTERVAL_MS,
};
use ble_autoconnect::{
    Address, AddressKind, AdvEventKind, AdvertisementReport, ConnectionIntent, DiscoveryParams,
    EventDispatcher, GapEvent, HostStack, SessionState, StackError, StackOp,
};
use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::{central, AddressType};
use nrf_softdevice::{raw, RawError, Softdevice};

/// Session states published to the status LED task.
pub type StateSender = Sender<'static, CriticalSectionRawMutex, SessionState, 4>;

/// [`HostStack`] backed by the SoftDevice.
///
/// `start_discovery` and `connect` only record the request; `cancel_discovery`
/// takes effect at once because the scan callback checks it before the
/// scanner is resumed.
pub struct SoftdeviceStack {
    scan_request: Option<(AddressKind, DiscoveryParams)>,
    connect_request: Option<ConnectionIntent>,
    scan_stopped: bool,
}

impl SoftdeviceStack {
    pub const fn new() -> Self {
        Self {
            scan_request: None,
            connect_request: None,
            scan_stopped: false,
        }
    }

    fn take_scan_request(&mut self) -> Option<(AddressKind, DiscoveryParams)> {
        self.scan_request.take()
    }

    fn take_connect_request(&mut self) -> Option<ConnectionIntent> {
        self.connect_request.take()
    }

    fn scan_stopped(&self) -> bool {
        self.scan_stopped
    }
}

impl HostStack for SoftdeviceStack {
    fn infer_local_address_type(&mut self) -> Result<AddressKind, StackError> {
        let mut addr: raw::ble_gap_addr_t = unsafe { mem::zeroed() };
        let ret = unsafe { raw::sd_ble_gap_addr_get(&mut addr) };
        RawError::convert(ret).map_err(|e| StackError::new(StackOp::InferAddressType, e as u32))?;

        match AddressKind::from_raw(addr.addr_type()) {
            AddressKind::Public => Ok(AddressKind::Public),
            AddressKind::RandomStatic => Ok(AddressKind::RandomStatic),
            // Private addresses are not identity addresses.
            _ => Err(StackError::new(
                StackOp::InferAddressType,
                raw::NRF_ERROR_INVALID_ADDR,
            )),
        }
    }

    fn start_discovery(
        &mut self,
        own_address_kind: AddressKind,
        params: &DiscoveryParams,
    ) -> Result<(), StackError> {
        if self.scan_request.is_some() || self.connect_request.is_some() {
            return Err(StackError::new(
                StackOp::StartDiscovery,
                raw::NRF_ERROR_INVALID_STATE,
            ));
        }
        self.scan_request = Some((own_address_kind, *params));
        self.scan_stopped = false;
        Ok(())
    }

    fn cancel_discovery(&mut self) -> Result<(), StackError> {
        self.scan_stopped = true;
        Ok(())
    }

    fn connect(&mut self, intent: &ConnectionIntent) -> Result<(), StackError> {
        if self.connect_request.is_some() {
            return Err(StackError::new(StackOp::Connect, raw::NRF_ERROR_BUSY));
        }
        self.connect_request = Some(*intent);
        Ok(())
    }
}

/// Drive the radio: wait for the host to settle, sync, then execute
/// whatever the controller asked for until the session is finished.
#[embassy_executor::task]
pub async fn ble_task(
    sd: &'static Softdevice,
    mut dispatcher: EventDispatcher<SoftdeviceStack>,
    state_tx: StateSender,
) -> ! {
    Timer::after(Duration::from_millis(HOST_SYNC_DELAY_MS)).await;
    dispatcher.dispatch(&GapEvent::Sync);

    loop {
        publish(&dispatcher, &state_tx);

        if let Some((own, params)) = dispatcher.stack_mut().take_scan_request() {
            run_scan(sd, &mut dispatcher, own, &params).await;
            continue;
        }

        if let Some(intent) = dispatcher.stack_mut().take_connect_request() {
            run_connection(sd, &mut dispatcher, &intent, &state_tx).await;
            continue;
        }

        // Nothing left to do. The session is idle or finished.
        Timer::after(Duration::from_secs(60)).await;
    }
}

async fn run_scan(
    sd: &Softdevice,
    dispatcher: &mut EventDispatcher<SoftdeviceStack>,
    own: AddressKind,
    params: &DiscoveryParams,
) {
    let config = scan_config(params);
    let mut seen: DuplicateFilter<DUPLICATE_FILTER_CAPACITY> = DuplicateFilter::new();
    info!(
        "scan started; own={} active={} dedup={}",
        own, config.active, params.filter_duplicates
    );

    let result = central::scan(sd, &config, |adv| {
        let data = unsafe { slice::from_raw_parts(adv.data.p_data, adv.data.len as usize) };
        let address = Address::new(
            AddressKind::from_raw(adv.peer_addr.addr_type()),
            adv.peer_addr.addr,
        );

        if params.filter_duplicates && !seen.first_sighting(&address) {
            return None;
        }

        let report =
            AdvertisementReport::new(address, report_kind(&adv.type_), data).with_rssi(adv.rssi);
        dispatcher.dispatch(&GapEvent::Discovery(report));

        // Returning `Some` keeps the SoftDevice from resuming the scanner.
        if dispatcher.stack().scan_stopped() {
            Some(())
        } else {
            None
        }
    })
    .await;

    match result {
        Ok(()) => info!("scan stopped"),
        Err(central::ScanError::Timeout) => {
            dispatcher.dispatch(&GapEvent::DiscoveryComplete { reason: 0 });
        }
        Err(central::ScanError::Raw(e)) => {
            warn!("scan ended with error {:?}", e);
            dispatcher.dispatch(&GapEvent::DiscoveryComplete {
                reason: e as u32 as i32,
            });
        }
    }
}

async fn run_connection(
    sd: &Softdevice,
    dispatcher: &mut EventDispatcher<SoftdeviceStack>,
    intent: &ConnectionIntent,
    state_tx: &StateSender,
) {
    let peer = nrf_softdevice::ble::Address::new(address_type(intent.peer.kind()), intent.peer.bytes());
    let whitelist = [&peer];

    let mut config = central::ConnectConfig::default();
    config.scan_config.whitelist = Some(&whitelist);
    config.scan_config.timeout = timeout_units(intent.timeout_ms);
    // With the default MTU `connect` skips its own exchange, so a failed
    // exchange cannot take down an established link.
    config.att_mtu = Some(raw::BLE_GATT_ATT_MTU_DEFAULT as u16);

    let conn = match central::connect(sd, &config).await {
        Ok(conn) => conn,
        Err(e) => {
            warn!("connect failed: {:?}", e);
            dispatcher.dispatch(&GapEvent::ConnectFailed {
                status: connect_status(e),
            });
            return;
        }
    };

    let Some(conn_handle) = conn.handle() else {
        dispatcher.dispatch(&GapEvent::ConnectFailed {
            status: raw::NRF_ERROR_INVALID_STATE,
        });
        return;
    };

    dispatcher.dispatch(&GapEvent::Connected { conn_handle });
    publish(dispatcher, state_tx);

    match request_att_mtu(conn_handle) {
        Ok(()) => {
            dispatcher.dispatch(&GapEvent::MtuUpdated {
                conn_handle,
                mtu: conn.att_mtu(),
            });
        }
        Err(e) => warn!("att mtu exchange failed: {:?}; keeping link", e),
    }

    // `conn` must stay alive; dropping the last handle disconnects.
    while conn.handle().is_some() {
        Timer::after(Duration::from_millis(LINK_POLL_INTERVAL_MS)).await;
    }

    // The SoftDevice wrapper does not surface the HCI reason.
    dispatcher.dispatch(&GapEvent::Disconnected {
        conn_handle,
        reason: 0,
    });
}

/// Ask the peer for a larger ATT MTU. Only a refused request is an error.
///
/// TODO: switch to `gatt_client::att_mtu_exchange` once nrf-softdevice
/// exports it, so the negotiated value is recorded on `Connection`.
fn request_att_mtu(conn_handle: u16) -> Result<(), RawError> {
    let ret = unsafe { raw::sd_ble_gattc_exchange_mtu_request(conn_handle, ATT_MTU) };
    RawError::convert(ret)
}

fn publish(dispatcher: &EventDispatcher<SoftdeviceStack>, state_tx: &StateSender) {
    let _ = state_tx.try_send(dispatcher.session().state());
}

fn scan_config(params: &DiscoveryParams) -> central::ScanConfig<'static> {
    let mut config = central::ScanConfig {
        active: !params.passive,
        ..Default::default()
    };
    if params.interval != 0 {
        config.interval = params.interval as u32;
    }
    if params.window != 0 {
        config.window = params.window as u32;
    }
    if let Some(ms) = params.duration_ms {
        config.timeout = timeout_units(ms);
    }
    config
}

/// Milliseconds → SoftDevice 10 ms timeout units. Never 0, which means
/// "forever".
fn timeout_units(ms: u32) -> u16 {
    (ms / 10).clamp(1, u16::MAX as u32) as u16
}

fn report_kind(t: &raw::ble_gap_adv_report_type_t) -> AdvEventKind {
    if t.scan_response() != 0 {
        AdvEventKind::ScanResponse
    } else if t.connectable() != 0 {
        if t.directed() != 0 {
            AdvEventKind::ConnectableDirected
        } else {
            AdvEventKind::ConnectableUndirected
        }
    } else if t.scannable() != 0 {
        AdvEventKind::ScannableUndirected
    } else {
        AdvEventKind::NonConnectable
    }
}

fn address_type(kind: AddressKind) -> AddressType {
    match kind {
        AddressKind::Public => AddressType::Public,
        AddressKind::RandomStatic => AddressType::RandomStatic,
        AddressKind::RandomResolvable => AddressType::RandomPrivateResolvable,
        AddressKind::RandomNonResolvable => AddressType::RandomPrivateNonResolvable,
    }
}

fn connect_status(e: central::ConnectError) -> u32 {
    match e {
        central::ConnectError::Timeout => raw::NRF_ERROR_TIMEOUT,
        central::ConnectError::Raw(raw_err) => raw_err as u32,
        central::ConnectError::NoAddresses => raw::NRF_ERROR_INVALID_PARAM,
        central::ConnectError::NoFreeConn => raw::NRF_ERROR_CONN_COUNT,
        _ => raw::NRF_ERROR_INTERNAL,
    }
}
