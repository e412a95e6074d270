//! Application-wide constants and compile-time configuration.
//!
//! The target peer, timing parameters, and scan settings live here so
//! they can be tuned in one place.

use crate::ble::{Address, DiscoveryParams};
use crate::error::ConfigError;

// BLE

/// The one peripheral this central connects to, in colon-hex notation
/// (most-significant octet first).
pub const TARGET_PEER_ADDRESS: &str = "c8:47:80:1f:05:b6";

/// Time the stack gets to establish the connection (ms).
pub const CONNECT_TIMEOUT_MS: u32 = 30_000;

/// Passive scan: only listen to advertisements, never send scan requests.
pub const SCAN_PASSIVE: bool = true;

/// Suppress repeated advertisements from devices already seen.
pub const SCAN_FILTER_DUPLICATES: bool = true;

/// Number of advertisers remembered by the software duplicate filter.
pub const DUPLICATE_FILTER_CAPACITY: usize = 32;

/// GAP device name of this central.
pub const DEVICE_NAME: &str = "ble-autoconnect";

/// ATT MTU requested once a link is up. Also sizes the SoftDevice GATT
/// buffers.
pub const ATT_MTU: u16 = 128;

/// Delay between SoftDevice enable and the first sync event (ms).
pub const HOST_SYNC_DELAY_MS: u64 = 1_000;

/// How often an established link is checked for disconnection (ms).
pub const LINK_POLL_INTERVAL_MS: u64 = 500;

/// Discovery parameters used when the host syncs: passive, duplicate
/// filtered, no duration limit.
pub fn discovery_params() -> DiscoveryParams {
    DiscoveryParams {
        passive: SCAN_PASSIVE,
        filter_duplicates: SCAN_FILTER_DUPLICATES,
        ..DiscoveryParams::default()
    }
}

// Status LED (nRF52840-DK LED1 → P0.13, active low)

/// Blink half-period while scanning (ms).
pub const LED_SCAN_BLINK_MS: u64 = 500;

/// Blink half-period while a connection is pending (ms).
pub const LED_CONNECT_BLINK_MS: u64 = 100;

/// The single peer the central is allowed to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetConfiguration {
    peer: Address,
}

impl TargetConfiguration {
    pub const fn new(peer: Address) -> Self {
        Self { peer }
    }

    /// Build from colon-hex text such as [`TARGET_PEER_ADDRESS`].
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Address::parse(text)
            .map(Self::new)
            .map_err(ConfigError::InvalidTarget)
    }

    pub fn peer(&self) -> &Address {
        &self.peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    #[test]
    fn default_target_parses() {
        let target = TargetConfiguration::parse(TARGET_PEER_ADDRESS).unwrap();
        assert_eq!(target.peer().bytes(), [0xB6, 0x05, 0x1F, 0x80, 0x47, 0xC8]);
    }

    #[test]
    fn bad_target_is_a_configuration_error() {
        assert_eq!(
            TargetConfiguration::parse("c8:47:80"),
            Err(ConfigError::InvalidTarget(ParseError::OctetCount))
        );
    }

    #[test]
    fn discovery_is_passive_and_unbounded() {
        let params = discovery_params();
        assert!(params.passive);
        assert!(params.filter_duplicates);
        assert_eq!(params.duration_ms, None);
    }
}
