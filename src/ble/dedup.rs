//! Duplicate advertisement suppression for scanners without a hardware
//! duplicate filter.
//!
//! Remembers the most recent `N` advertisers; when full, the oldest entry
//! is evicted.

use heapless::Vec;

use crate::ble::Address;

pub struct DuplicateFilter<const N: usize> {
    seen: Vec<[u8; 6], N>,
}

impl<const N: usize> DuplicateFilter<N> {
    pub const fn new() -> Self {
        Self { seen: Vec::new() }
    }

    /// Returns `true` the first time an address is offered, `false` for
    /// repeats.
    pub fn first_sighting(&mut self, address: &Address) -> bool {
        let bytes = address.bytes();
        if self.seen.contains(&bytes) {
            return false;
        }

        if self.seen.is_full() {
            self.seen.remove(0);
        }
        let _ = self.seen.push(bytes);
        true
    }
}

impl<const N: usize> Default for DuplicateFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::AddressKind;

    fn addr(last: u8) -> Address {
        Address::new(AddressKind::Public, [last, 0, 0, 0, 0, 0])
    }

    #[test]
    fn repeats_are_suppressed() {
        let mut filter = DuplicateFilter::<4>::new();
        assert!(filter.first_sighting(&addr(1)));
        assert!(!filter.first_sighting(&addr(1)));
        assert!(filter.first_sighting(&addr(2)));
        assert!(!filter.first_sighting(&addr(2)));
    }

    #[test]
    fn oldest_entry_evicted_when_full() {
        let mut filter = DuplicateFilter::<2>::new();
        assert!(filter.first_sighting(&addr(1)));
        assert!(filter.first_sighting(&addr(2)));
        assert!(filter.first_sighting(&addr(3)));
        // addr(1) was evicted, so it counts as new again.
        assert!(filter.first_sighting(&addr(1)));
        assert!(!filter.first_sighting(&addr(3)));
    }

    #[test]
    fn address_kind_is_ignored() {
        let mut filter = DuplicateFilter::<2>::new();
        assert!(filter.first_sighting(&addr(1)));
        let random = Address::new(AddressKind::RandomStatic, addr(1).bytes());
        assert!(!filter.first_sighting(&random));
    }
}
