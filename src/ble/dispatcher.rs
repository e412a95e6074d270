//! Single entry point for GAP events coming from the host stack.

use crate::ble::controller::ScanConnectController;
use crate::ble::{GapEvent, HostStack, RadioSession};

/// What the dispatcher reports back to the stack for each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventStatus {
    /// The event was consumed. Rejecting a candidate is not an error.
    Handled,
}

/// Owns the radio session and the stack handle, and routes every event
/// to the controller. Events must be dispatched serially.
pub struct EventDispatcher<S: HostStack> {
    controller: ScanConnectController,
    session: RadioSession,
    stack: S,
}

impl<S: HostStack> EventDispatcher<S> {
    pub fn new(controller: ScanConnectController, stack: S) -> Self {
        Self {
            controller,
            session: RadioSession::new(),
            stack,
        }
    }

    pub fn dispatch(&mut self, event: &GapEvent<'_>) -> EventStatus {
        let controller = &self.controller;
        let session = &mut self.session;

        match event {
            GapEvent::Sync => {
                if let Err(e) = controller.start(session, &mut self.stack) {
                    error!("failed to start scanning: {:?} rc={}", e.op, e.code);
                }
            }
            GapEvent::Reset { reason } => controller.on_reset(session, *reason),
            GapEvent::Discovery(report) => {
                if let Err(e) = controller.on_report(session, &mut self.stack, report) {
                    error!("scan -> connect aborted: {:?} rc={}", e.op, e.code);
                }
            }
            GapEvent::DiscoveryComplete { reason } => {
                controller.on_discovery_complete(session, *reason)
            }
            GapEvent::Connected { conn_handle } => controller.on_connected(session, *conn_handle),
            GapEvent::ConnectFailed { status } => controller.on_connect_failed(session, *status),
            GapEvent::Disconnected {
                conn_handle,
                reason,
            } => controller.on_disconnected(session, *conn_handle, *reason),
            GapEvent::MtuUpdated { conn_handle, mtu } => {
                info!("mtu update; conn_handle={} mtu={}", conn_handle, mtu)
            }
            GapEvent::Other(id) => trace!("gap event {}", id),
        }

        EventStatus::Handled
    }

    pub fn session(&self) -> &RadioSession {
        &self.session
    }

    pub fn controller(&self) -> &ScanConnectController {
        &self.controller
    }

    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }
}
