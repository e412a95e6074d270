//! Decides whether a discovery report is the peer we want to connect to.

use crate::ble::adv_parser::parse_fields;
use crate::ble::{Address, AdvertisementReport};
use crate::error::ParseError;

/// Outcome of evaluating one report against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    Match,
    /// Event type does not allow a connection to be initiated.
    NotConnectable,
    /// The advertising data field set did not parse.
    MalformedData(ParseError),
    /// Connectable, well-formed, but from another device.
    AddressMismatch,
}

/// Evaluate `report` against `target`, short-circuiting on the first
/// failed check: event type, then field set, then address.
pub fn evaluate(report: &AdvertisementReport<'_>, target: &Address) -> Verdict {
    if !report.kind.is_connectable() {
        return Verdict::NotConnectable;
    }

    if let Err(e) = parse_fields(report.data) {
        return Verdict::MalformedData(e);
    }

    if !report.address.matches(target) {
        return Verdict::AddressMismatch;
    }

    Verdict::Match
}

/// `true` if the report is a connectable, well-formed advertisement from
/// `target`.
pub fn matches(report: &AdvertisementReport<'_>, target: &Address) -> bool {
    evaluate(report, target) == Verdict::Match
}
