//! Advertising data (AD structure) parsing.
//!
//! Advertising payloads are a sequence of `[len][type][len - 1 bytes]`
//! structures. A zero length byte ends the significant part of the payload;
//! anything after it is padding.

use heapless::String;

use crate::error::ParseError;

pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_UUID16_INCOMPLETE: u8 = 0x02;
pub const AD_TYPE_UUID16_COMPLETE: u8 = 0x03;
pub const AD_TYPE_UUID32_INCOMPLETE: u8 = 0x04;
pub const AD_TYPE_UUID32_COMPLETE: u8 = 0x05;
pub const AD_TYPE_UUID128_INCOMPLETE: u8 = 0x06;
pub const AD_TYPE_UUID128_COMPLETE: u8 = 0x07;
pub const AD_TYPE_SHORT_NAME: u8 = 0x08;
pub const AD_TYPE_COMPLETE_NAME: u8 = 0x09;
pub const AD_TYPE_TX_POWER: u8 = 0x0A;
pub const AD_TYPE_CONN_INTERVAL_RANGE: u8 = 0x12;
pub const AD_TYPE_SERVICE_DATA16: u8 = 0x16;
pub const AD_TYPE_PUBLIC_TARGET_ADDRESS: u8 = 0x17;
pub const AD_TYPE_APPEARANCE: u8 = 0x19;
pub const AD_TYPE_ADV_INTERVAL: u8 = 0x1A;
pub const AD_TYPE_SERVICE_DATA32: u8 = 0x20;
pub const AD_TYPE_SERVICE_DATA128: u8 = 0x21;
pub const AD_TYPE_MANUFACTURER_DATA: u8 = 0xFF;

/// One `type + data` element of an advertising payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdStructure<'a> {
    pub ad_type: u8,
    pub data: &'a [u8],
}

/// Iterator over the AD structures of a payload.
///
/// Yields an error once for a truncated structure and then stops.
pub struct AdStructures<'a> {
    data: &'a [u8],
    done: bool,
}

pub fn ad_structures(data: &[u8]) -> AdStructures<'_> {
    AdStructures { data, done: false }
}

impl<'a> Iterator for AdStructures<'a> {
    type Item = Result<AdStructure<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.data.is_empty() {
            return None;
        }

        let len = self.data[0] as usize;
        if len == 0 {
            self.done = true;
            return None;
        }
        if len + 1 > self.data.len() {
            self.done = true;
            return Some(Err(ParseError::TruncatedField));
        }

        let item = AdStructure {
            ad_type: self.data[1],
            data: &self.data[2..len + 1],
        };
        self.data = &self.data[len + 1..];
        Some(Ok(item))
    }
}

/// The fields of an advertising payload the central logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdFields<'a> {
    pub flags: Option<u8>,
    /// Local name bytes, complete or shortened.
    pub name: Option<&'a [u8]>,
}

impl AdFields<'_> {
    /// Local name for log output, truncated to 32 bytes.
    pub fn device_name(&self) -> String<32> {
        let mut name = String::new();
        if let Some(s) = self.name.and_then(|n| core::str::from_utf8(n).ok()) {
            for c in s.chars() {
                if name.push(c).is_err() {
                    break;
                }
            }
        }
        if name.is_empty() {
            let _ = name.push_str("Unknown");
        }
        name
    }
}

/// Validate and decode a complete advertising payload.
///
/// Fails on truncated structures and on structures whose length is not
/// valid for their type (e.g. a flags field that is not one byte).
/// Unknown AD types are skipped.
pub fn parse_fields(data: &[u8]) -> Result<AdFields<'_>, ParseError> {
    let mut fields = AdFields::default();

    for item in ad_structures(data) {
        let AdStructure { ad_type, data } = item?;
        let invalid = ParseError::InvalidFieldLength { ad_type };

        match ad_type {
            AD_TYPE_FLAGS => {
                if data.len() != 1 {
                    return Err(invalid);
                }
                fields.flags = Some(data[0]);
            }
            AD_TYPE_UUID16_INCOMPLETE | AD_TYPE_UUID16_COMPLETE => {
                if data.len() % 2 != 0 {
                    return Err(invalid);
                }
            }
            AD_TYPE_UUID32_INCOMPLETE | AD_TYPE_UUID32_COMPLETE => {
                if data.len() % 4 != 0 {
                    return Err(invalid);
                }
            }
            AD_TYPE_UUID128_INCOMPLETE | AD_TYPE_UUID128_COMPLETE => {
                if data.len() % 16 != 0 {
                    return Err(invalid);
                }
            }
            AD_TYPE_SHORT_NAME | AD_TYPE_COMPLETE_NAME => {
                fields.name = Some(data);
            }
            AD_TYPE_TX_POWER => {
                if data.len() != 1 {
                    return Err(invalid);
                }
            }
            AD_TYPE_CONN_INTERVAL_RANGE => {
                if data.len() != 4 {
                    return Err(invalid);
                }
            }
            // Service data starts with the service UUID.
            AD_TYPE_SERVICE_DATA16 => {
                if data.len() < 2 {
                    return Err(invalid);
                }
            }
            AD_TYPE_SERVICE_DATA32 => {
                if data.len() < 4 {
                    return Err(invalid);
                }
            }
            AD_TYPE_SERVICE_DATA128 => {
                if data.len() < 16 {
                    return Err(invalid);
                }
            }
            AD_TYPE_PUBLIC_TARGET_ADDRESS => {
                if data.len() % 6 != 0 {
                    return Err(invalid);
                }
            }
            AD_TYPE_APPEARANCE | AD_TYPE_ADV_INTERVAL => {
                if data.len() != 2 {
                    return Err(invalid);
                }
            }
            // Manufacturer data is opaque; any length is accepted.
            _ => {}
        }
    }

    Ok(fields)
}
