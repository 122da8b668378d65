/// Endpoint addresses and the allocator that hands them out
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

/// Endpoint address.
///
/// Addresses handed out by an allocator are positive and unique; `new` accepts
/// any value so callers can name unroutable destinations such as `@0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(u64);

impl Address {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl From<u64> for Address {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Source of fresh endpoint addresses.
///
/// Implementations must return strictly increasing values and never hand out
/// the same address twice for the lifetime of the allocator.
pub trait AddressAllocator {
    fn allocate(&mut self) -> Address;
}

/// Counter-based allocator: 1, 2, 3, ...
#[derive(Debug, Clone)]
pub struct MonotonicAllocator {
    next: u64,
    exhausted: bool,
}

impl MonotonicAllocator {
    /// Create an allocator starting at 1
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create an allocator whose first address is `first` (clamped to 1)
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: first.max(1),
            exhausted: false,
        }
    }

    /// Next address that `allocate` would return
    pub fn peek(&self) -> Address {
        Address(self.next)
    }
}

impl Default for MonotonicAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressAllocator for MonotonicAllocator {
    fn allocate(&mut self) -> Address {
        if self.exhausted {
            // Out of addresses; uniqueness no longer holds past this point.
            error!("Address space exhausted, reissuing {}", Address(self.next));
            return Address(self.next);
        }
        let address = Address(self.next);
        match self.next.checked_add(1) {
            Some(next) => self.next = next,
            None => self.exhausted = true,
        }
        address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_starts_at_one() {
        let mut alloc = MonotonicAllocator::new();
        assert_eq!(alloc.allocate(), Address::new(1));
        assert_eq!(alloc.allocate(), Address::new(2));
        assert_eq!(alloc.peek(), Address::new(3));
    }

    #[test]
    fn test_allocator_strictly_increasing() {
        let mut alloc = MonotonicAllocator::starting_at(40);
        let addrs: Vec<Address> = (0..100).map(|_| alloc.allocate()).collect();
        assert!(addrs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(addrs[0], Address::new(40));
    }

    #[test]
    fn test_allocator_zero_start_is_clamped() {
        let mut alloc = MonotonicAllocator::starting_at(0);
        assert_eq!(alloc.allocate(), Address::new(1));
    }

    #[test]
    fn test_allocator_never_yields_zero() {
        let mut alloc = MonotonicAllocator::starting_at(0);
        assert!((0..10).all(|_| alloc.allocate().raw() > 0));
    }

    #[test]
    fn test_address_display() {
        assert_eq!(Address::new(7).to_string(), "@7");
    }

    #[test]
    fn test_address_serializes_as_integer() {
        let json = serde_json::to_string(&Address::new(12)).unwrap();
        assert_eq!(json, "12");
    }
}
