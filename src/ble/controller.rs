//! Scan → cancel → connect state machine.
//!
//! ```text
//!  Idle ──sync──▶ Scanning ──match──▶ Connecting ──▶ Connected ──▶ Disconnected
//!   ▲                │                     │
//!   └─discovery done─┘                     └──▶ Failed
//! ```
//!
//! The controller holds only configuration. The [`RadioSession`] it moves
//! between states and the [`HostStack`] it drives are passed in on every
//! call, so the owner decides where they live.

use crate::ble::adv_parser::parse_fields;
use crate::ble::filter::{self, Verdict};
use crate::ble::{
    AdvertisementReport, ConnectionIntent, DiscoveryParams, HostStack, RadioSession, SessionState,
};
use crate::config::{self, TargetConfiguration, CONNECT_TIMEOUT_MS};
use crate::error::StackError;

pub struct ScanConnectController {
    target: TargetConfiguration,
    discovery: DiscoveryParams,
    connect_timeout_ms: u32,
}

impl ScanConnectController {
    pub fn new(target: TargetConfiguration) -> Self {
        Self {
            target,
            discovery: config::discovery_params(),
            connect_timeout_ms: CONNECT_TIMEOUT_MS,
        }
    }

    pub fn with_connect_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    pub fn target(&self) -> &TargetConfiguration {
        &self.target
    }

    pub fn discovery_params(&self) -> &DiscoveryParams {
        &self.discovery
    }

    /// Idle → Scanning, on host sync.
    ///
    /// Ignored unless the session is idle. On error the session stays idle.
    pub fn start<S: HostStack>(
        &self,
        session: &mut RadioSession,
        stack: &mut S,
    ) -> Result<(), StackError> {
        if session.state() != SessionState::Idle {
            debug!("sync ignored in state {:?}", session.state());
            return Ok(());
        }

        let own = stack.infer_local_address_type()?;
        stack.start_discovery(own, &self.discovery)?;
        session.set(SessionState::Scanning);
        info!("scanning for {}", self.target.peer());
        Ok(())
    }

    /// Scanning → Connecting, when `report` comes from the target.
    ///
    /// Returns the intent handed to the stack, or `None` if the report was
    /// not acted on. A failed cancel or address-type lookup leaves the
    /// session in `Scanning`; a refused connect request moves it to
    /// `Failed`.
    pub fn on_report<S: HostStack>(
        &self,
        session: &mut RadioSession,
        stack: &mut S,
        report: &AdvertisementReport<'_>,
    ) -> Result<Option<ConnectionIntent>, StackError> {
        if !session.is_scanning() {
            return Ok(None);
        }

        if let Ok(fields) = parse_fields(report.data) {
            debug!(
                "device found: {} name={} rssi={}",
                report.address,
                fields.device_name().as_str(),
                report.rssi
            );
        }

        match filter::evaluate(report, self.target.peer()) {
            Verdict::Match => {}
            Verdict::MalformedData(e) => {
                debug!("{}: bad advertising data: {:?}", report.address, e);
                return Ok(None);
            }
            Verdict::NotConnectable | Verdict::AddressMismatch => return Ok(None),
        }

        info!("target {} found, cancelling scan", report.address);

        // Connection and discovery cannot run together on one radio.
        stack.cancel_discovery()?;

        let own_address_kind = match stack.infer_local_address_type() {
            Ok(kind) => kind,
            Err(e) => {
                warn!("scan cancelled but no connection attempt was made");
                return Err(e);
            }
        };

        let intent = ConnectionIntent {
            own_address_kind,
            peer: report.address,
            timeout_ms: self.connect_timeout_ms,
        };

        match stack.connect(&intent) {
            Ok(()) => {
                session.set(SessionState::Connecting { peer: intent.peer });
                info!(
                    "connecting to {} (timeout {} ms)",
                    intent.peer, intent.timeout_ms
                );
                Ok(Some(intent))
            }
            Err(e) => {
                session.set(SessionState::Failed);
                Err(e)
            }
        }
    }

    /// Connecting → Connected.
    pub fn on_connected(&self, session: &mut RadioSession, conn_handle: u16) {
        match session.state() {
            SessionState::Connecting { peer } => {
                info!("connection completed; peer={} conn_handle={}", peer, conn_handle);
                session.set(SessionState::Connected { conn_handle });
            }
            other => warn!("connection {} reported in state {:?}", conn_handle, other),
        }
    }

    /// Connecting → Failed.
    pub fn on_connect_failed(&self, session: &mut RadioSession, status: u32) {
        if let SessionState::Connecting { peer } = session.state() {
            error!("connection to {} failed; status={}", peer, status);
            session.set(SessionState::Failed);
        }
    }

    /// Connected → Disconnected.
    pub fn on_disconnected(&self, session: &mut RadioSession, conn_handle: u16, reason: u8) {
        match session.state() {
            SessionState::Connected { conn_handle: h } if h == conn_handle => {
                warn!("disconnected; conn_handle={} reason={}", conn_handle, reason);
                session.set(SessionState::Disconnected);
            }
            _ => trace!("disconnect of unknown conn_handle={}", conn_handle),
        }
    }

    /// Scanning → Idle, when the stack ends discovery on its own.
    pub fn on_discovery_complete(&self, session: &mut RadioSession, reason: i32) {
        if session.is_scanning() {
            info!("discovery complete; reason={}", reason);
            session.set(SessionState::Idle);
        }
    }

    /// Any → Idle. The stack dropped every GAP procedure; the next sync
    /// starts scanning again.
    pub fn on_reset(&self, session: &mut RadioSession, reason: i32) {
        error!("resetting state; reason={}", reason);
        session.set(SessionState::Idle);
    }
}
