//! Error types for ble-autoconnect.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

use core::fmt;

/// Text or advertising data that could not be decoded.
///
/// Never fatal inside the discovery path: a report whose data fails to
/// parse is simply not a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Address text did not split into exactly six octets.
    OctetCount,
    /// An octet was not exactly two characters wide.
    OctetWidth,
    /// An octet contained a non-hexadecimal character.
    InvalidHex,
    /// An AD structure claims more bytes than the payload holds.
    TruncatedField,
    /// An AD structure has a length that is invalid for its type.
    InvalidFieldLength {
        /// AD type of the offending structure.
        ad_type: u8,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::OctetCount => f.write_str("address must have six octets"),
            ParseError::OctetWidth => f.write_str("address octets must be two hex digits"),
            ParseError::InvalidHex => f.write_str("address contains a non-hex character"),
            ParseError::TruncatedField => f.write_str("advertising data field is truncated"),
            ParseError::InvalidFieldLength { ad_type } => {
                write!(f, "invalid length for AD type 0x{:02x}", ad_type)
            }
        }
    }
}

/// Host-stack procedure that reported a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StackOp {
    InferAddressType,
    StartDiscovery,
    CancelDiscovery,
    Connect,
}

/// A failing call into the host BLE stack, with the stack's status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StackError {
    pub op: StackOp,
    pub code: u32,
}

impl StackError {
    pub const fn new(op: StackOp, code: u32) -> Self {
        Self { op, code }
    }
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} failed; rc={}", self.op, self.code)
    }
}

/// Startup failures. These abort initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The configured target address is not valid colon-hex.
    InvalidTarget(ParseError),
    /// The host stack could not be brought up (raw status code).
    HostBringUp(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_error_names_op_and_code() {
        let msg = std::format!("{}", StackError::new(StackOp::CancelDiscovery, 2));
        assert_eq!(msg, "CancelDiscovery failed; rc=2");
    }

    #[test]
    fn display_mentions_ad_type() {
        let msg = std::format!("{}", ParseError::InvalidFieldLength { ad_type: 0x01 });
        assert_eq!(msg, "invalid length for AD type 0x01");
    }
}
