//! BLE device addresses and the colon-hex notation used to configure them.
//!
//! The radio hands addresses over least-significant octet first, while
//! humans write them most-significant octet first (`c8:47:80:1f:05:b6`).
//! [`Address`] always stores the radio order; parsing and `Display`
//! do the reversal.

use core::fmt;
use core::str::FromStr;

use crate::error::ParseError;

/// Number of octets in a BLE device address.
pub const ADDRESS_LEN: usize = 6;

/// Address type tag carried next to the six address bytes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressKind {
    /// Public (IEEE-assigned) address.
    Public = 0x00,
    /// Random static address.
    RandomStatic = 0x01,
    /// Random private resolvable address.
    RandomResolvable = 0x02,
    /// Random private non-resolvable address.
    RandomNonResolvable = 0x03,
}

impl AddressKind {
    /// Decode the HCI address type byte. Unknown values are treated as
    /// random static, the most common kind for peripherals.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => AddressKind::Public,
            0x02 => AddressKind::RandomResolvable,
            0x03 => AddressKind::RandomNonResolvable,
            _ => AddressKind::RandomStatic,
        }
    }
}

/// A 6-byte BLE device address in radio (little-endian) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    kind: AddressKind,
    bytes: [u8; ADDRESS_LEN],
}

impl Address {
    /// Build an address from bytes already in radio order.
    pub const fn new(kind: AddressKind, bytes: [u8; ADDRESS_LEN]) -> Self {
        Self { kind, bytes }
    }

    /// Parse `xx:xx:xx:xx:xx:xx` (most-significant octet first).
    ///
    /// The resulting address is tagged [`AddressKind::Public`]; use
    /// [`Address::with_kind`] to retag it.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut bytes = [0u8; ADDRESS_LEN];
        let mut count = 0;

        for octet in text.split(':') {
            if count == ADDRESS_LEN {
                return Err(ParseError::OctetCount);
            }
            // Human notation is high octet first; radio order is reversed.
            bytes[ADDRESS_LEN - 1 - count] = parse_octet(octet)?;
            count += 1;
        }

        if count != ADDRESS_LEN {
            return Err(ParseError::OctetCount);
        }

        Ok(Self::new(AddressKind::Public, bytes))
    }

    pub const fn with_kind(self, kind: AddressKind) -> Self {
        Self {
            kind,
            bytes: self.bytes,
        }
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    /// Address bytes in radio order.
    pub fn bytes(&self) -> [u8; ADDRESS_LEN] {
        self.bytes
    }

    /// Exact 6-byte comparison. The type tag is not part of the match.
    pub fn matches(&self, other: &Address) -> bool {
        self.bytes == other.bytes
    }
}

fn parse_octet(octet: &str) -> Result<u8, ParseError> {
    let digits = octet.as_bytes();
    if digits.len() != 2 {
        return Err(ParseError::OctetWidth);
    }
    Ok((hex_value(digits[0])? << 4) | hex_value(digits[1])?)
}

fn hex_value(c: u8) -> Result<u8, ParseError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(ParseError::InvalidHex),
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bytes;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Address {
    fn format(&self, fmt: defmt::Formatter) {
        let b = &self.bytes;
        defmt::write!(
            fmt,
            "{=u8:02x}:{=u8:02x}:{=u8:02x}:{=u8:02x}:{=u8:02x}:{=u8:02x} ({})",
            b[5],
            b[4],
            b[3],
            b[2],
            b[1],
            b[0],
            self.kind
        )
    }
}
