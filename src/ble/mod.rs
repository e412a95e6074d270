//! Bluetooth Low Energy central-role core.
//!
//! This module decides which peer to connect to and when:
//!
//! 1. **Address** - colon-hex target parsing and byte-exact matching.
//! 2. **Filter** - accepts connectable advertisements from the target.
//! 3. **Controller** - the scan -> cancel -> connect state machine over
//!    an owned [`RadioSession`].
//! 4. **Dispatcher** - the single handler the host stack feeds every GAP
//!    event into.
//!
//! The host stack itself is reached only through the [`HostStack`] trait,
//! so everything here runs on the host in unit tests.

pub mod address;
pub mod adv_parser;
pub mod controller;
pub mod dedup;
pub mod dispatcher;
pub mod filter;

use crate::error::StackError;
pub use address::{Address, AddressKind};

/// Advertising PDU classification of a discovery report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvEventKind {
    /// ADV_IND - connectable and scannable undirected.
    ConnectableUndirected,
    /// ADV_DIRECT_IND - connectable directed.
    ConnectableDirected,
    /// ADV_SCAN_IND - scannable undirected, not connectable.
    ScannableUndirected,
    /// ADV_NONCONN_IND.
    NonConnectable,
    /// SCAN_RSP.
    ScanResponse,
}

impl AdvEventKind {
    /// A connection can only be initiated against these two kinds.
    pub fn is_connectable(self) -> bool {
        matches!(
            self,
            AdvEventKind::ConnectableUndirected | AdvEventKind::ConnectableDirected
        )
    }
}

/// One received advertisement.
///
/// Borrows the stack's buffer, so it cannot outlive the callback that
/// delivered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisementReport<'a> {
    pub address: Address,
    pub kind: AdvEventKind,
    pub rssi: i8,
    pub data: &'a [u8],
}

impl<'a> AdvertisementReport<'a> {
    pub fn new(address: Address, kind: AdvEventKind, data: &'a [u8]) -> Self {
        Self {
            address,
            kind,
            rssi: 0,
            data,
        }
    }

    pub fn with_rssi(self, rssi: i8) -> Self {
        Self { rssi, ..self }
    }
}

/// Events delivered by the host stack, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapEvent<'a> {
    /// Host and controller are synchronised; GAP procedures may start.
    Sync,
    /// The host stack reset itself; every GAP procedure was abandoned.
    Reset { reason: i32 },
    /// An advertisement was received while scanning.
    Discovery(AdvertisementReport<'a>),
    /// Discovery ended on its own (duration elapsed or stack stopped it).
    DiscoveryComplete { reason: i32 },
    /// The pending connection was established.
    Connected { conn_handle: u16 },
    /// The pending connection attempt failed or timed out.
    ConnectFailed { status: u32 },
    /// An established link went down.
    Disconnected { conn_handle: u16, reason: u8 },
    /// ATT MTU exchange finished on a link.
    MtuUpdated { conn_handle: u16, mtu: u16 },
    /// Any other event id, accepted and traced only.
    Other(u16),
}

/// Scan window configuration handed to [`HostStack::start_discovery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiscoveryParams {
    /// Listen only; never send scan requests.
    pub passive: bool,
    /// Let the radio layer drop repeated reports from seen devices.
    pub filter_duplicates: bool,
    /// Scan interval in 0.625 ms units; 0 selects the stack default.
    pub interval: u16,
    /// Scan window in 0.625 ms units; 0 selects the stack default.
    pub window: u16,
    /// Scan duration in milliseconds; `None` scans until cancelled.
    pub duration_ms: Option<u32>,
}

impl Default for DiscoveryParams {
    fn default() -> Self {
        Self {
            passive: true,
            filter_duplicates: true,
            interval: 0,
            window: 0,
            duration_ms: None,
        }
    }
}

/// Everything the stack needs to open a link to a matched peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionIntent {
    pub own_address_kind: AddressKind,
    pub peer: Address,
    pub timeout_ms: u32,
}

/// Calls the core makes into the host BLE stack.
///
/// Every call returns immediately. Outcomes of `start_discovery` and
/// `connect` arrive later as [`GapEvent`]s through the same dispatcher;
/// `cancel_discovery` is the only call whose status is final.
pub trait HostStack {
    /// Pick the local address type to use (public preferred).
    fn infer_local_address_type(&mut self) -> Result<AddressKind, StackError>;

    fn start_discovery(
        &mut self,
        own_address_kind: AddressKind,
        params: &DiscoveryParams,
    ) -> Result<(), StackError>;

    /// Stop the active scan. An error means the scan is still running.
    fn cancel_discovery(&mut self) -> Result<(), StackError>;

    fn connect(&mut self, intent: &ConnectionIntent) -> Result<(), StackError>;
}

/// State of the process-wide radio session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// Nothing running; waiting for host sync.
    Idle,
    /// Discovery active.
    Scanning,
    /// Scan cancelled, connection request outstanding.
    Connecting { peer: Address },
    /// Link established.
    Connected { conn_handle: u16 },
    /// The single connection attempt failed. Terminal.
    Failed,
    /// The link was established and later dropped. Terminal.
    Disconnected,
}

/// Owned radio session. At most one of {scan, pending connection} is
/// active at a time; only the controller changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioSession {
    state: SessionState,
}

impl RadioSession {
    pub const fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == SessionState::Scanning
    }

    pub(crate) fn set(&mut self, next: SessionState) {
        if next != self.state {
            debug!("session: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

impl Default for RadioSession {
    fn default() -> Self {
        Self::new()
    }
}
