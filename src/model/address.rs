use std::fmt;

/// A virtual address inside the captured process.
///
/// Addresses are the identity of heap objects, GC roots, modules and application
/// domains. All cross-entity relationships in the graph are stored as addresses
/// (or other keys) rather than as direct references, so the graph never contains
/// ownership cycles.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub u64);

impl Address {
    /// The null address
    pub const NULL: Address = Address(0);

    /// Creates a new address from a raw 64-bit value
    #[must_use]
    pub fn new(value: u64) -> Self {
        Address(value)
    }

    /// Returns the raw address value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns true if this is the null address (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address(value)
    }
}

impl From<Address> for u64 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{:016x})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_address_null() {
        assert!(Address::NULL.is_null());
        assert!(Address::default().is_null());
        assert!(!Address::new(0x1000).is_null());
    }

    #[test]
    fn test_address_conversions() {
        let address: Address = 0xdead_beef_u64.into();
        assert_eq!(address.value(), 0xdead_beef);

        let raw: u64 = address.into();
        assert_eq!(raw, 0xdead_beef);
    }

    #[test]
    fn test_address_formatting() {
        let address = Address(0x7ff6_0000_1234);
        assert_eq!(format!("{}", address), "0x00007ff600001234");
        assert_eq!(format!("{:?}", address), "Address(0x00007ff600001234)");
        assert_eq!(format!("{:x}", address), "7ff600001234");
    }

    #[test]
    fn test_address_ordering_and_hash() {
        let mut addresses = vec![Address(3), Address(1), Address(2)];
        addresses.sort();
        assert_eq!(addresses, vec![Address(1), Address(2), Address(3)]);

        let mut map = HashMap::new();
        map.insert(Address(1), "one");
        assert_eq!(map.get(&Address(1)), Some(&"one"));
    }
}
