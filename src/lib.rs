//! Library interface for ble-autoconnect.
//!
//! Holds the hardware-independent part of the central: address handling,
//! advertisement parsing, the target filter, and the scan -> connect state
//! machine. Everything here builds and tests on the host.
//!
//! Usage: `cargo test --lib`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and drives this library through the SoftDevice adapter in radio.rs.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module below.
mod fmt;

pub mod ble;
pub mod config;
pub mod error;

pub use ble::controller::ScanConnectController;
pub use ble::dispatcher::{EventDispatcher, EventStatus};
pub use ble::{
    Address, AddressKind, AdvEventKind, AdvertisementReport, ConnectionIntent, DiscoveryParams,
    GapEvent, HostStack, RadioSession, SessionState,
};
pub use config::TargetConfiguration;
pub use error::{ConfigError, ParseError, StackError, StackOp};

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════
