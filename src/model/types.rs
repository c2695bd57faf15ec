//! Loaded runtime types and their identity keys.
//!
//! The same assembly can be loaded into several application domains (think IIS),
//! which produces distinct loaded types that share a display name. A type is
//! therefore identified by the pair of its runtime identity token (the method
//! table) and its name, see [`DumpTypeKey`].

use std::{fmt, sync::OnceLock};

use bitflags::bitflags;

use crate::model::Address;

/// Identity of a loaded type: (method table, display name).
///
/// Both halves are required. Two types with the same name but different method
/// tables are distinct loaded types; a type rediscovered with the same method
/// table and name is the same type.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DumpTypeKey {
    /// The runtime identity token (method table address)
    pub method_table: u64,
    /// Fully qualified display name; may be empty for unnamed runtime types
    pub name: String,
}

impl DumpTypeKey {
    /// Create a new key
    pub fn new(method_table: u64, name: impl Into<String>) -> Self {
        DumpTypeKey {
            method_table,
            name: name.into(),
        }
    }
}

impl fmt::Display for DumpTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mt: 0x{:x})", self.name, self.method_table)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    /// Classification flags of a loaded type
    pub struct TypeFlags: u32 {
        /// Type is an interface
        const INTERFACE = 0x0001;
        /// Type is abstract
        const ABSTRACT = 0x0002;
        /// Type is sealed
        const SEALED = 0x0004;
        /// Type is an array type
        const ARRAY = 0x0008;
        /// Type is an enumeration
        const ENUM = 0x0010;
        /// Type derives from System.Exception
        const EXCEPTION = 0x0020;
        /// Instances of the type have a finalizer
        const FINALIZABLE = 0x0040;
        /// Type is an unmanaged pointer type
        const POINTER = 0x0080;
        /// Type is a primitive
        const PRIMITIVE = 0x0100;
        /// Type is System.String
        const STRING = 0x0200;
        /// Type is System.RuntimeType
        const RUNTIME_TYPE = 0x0400;
        /// Instances contain GC references
        const CONTAINS_POINTERS = 0x0800;
        /// Visibility is internal
        const INTERNAL = 0x1000;
        /// Visibility is private
        const PRIVATE = 0x2000;
        /// Visibility is protected
        const PROTECTED = 0x4000;
        /// Type is the free-space marker of the GC heap
        const FREE = 0x8000;
    }
}

/// A loaded runtime type.
///
/// Created once during the module/type pass. The base-type link is set at most
/// once, by the deferred fix-up that runs after every module has been walked, and
/// the object list is appended to during the object pass. Both are frozen once
/// the type is handed to a repository.
#[derive(Debug)]
pub struct DumpType {
    /// Identity of this type
    pub key: DumpTypeKey,
    /// Base address of the owning module, if the type was discovered through one
    pub module: Option<Address>,
    /// Size of an instance without variable-length data
    pub base_size: u64,
    /// Classification flags
    pub flags: TypeFlags,
    base: OnceLock<DumpTypeKey>,
    objects: boxcar::Vec<Address>,
}

impl DumpType {
    /// Create a new type without base type and objects
    pub fn new(key: DumpTypeKey, module: Option<Address>, base_size: u64, flags: TypeFlags) -> Self {
        DumpType {
            key,
            module,
            base_size,
            flags,
            base: OnceLock::new(),
            objects: boxcar::Vec::new(),
        }
    }

    /// The method table of this type
    #[must_use]
    pub fn method_table(&self) -> u64 {
        self.key.method_table
    }

    /// The display name of this type
    #[must_use]
    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// Key of the base type, if it was resolved
    pub fn base(&self) -> Option<&DumpTypeKey> {
        self.base.get()
    }

    /// Records the base type. Returns `false` if a base was already set.
    pub(crate) fn set_base(&self, base: DumpTypeKey) -> bool {
        self.base.set(base).is_ok()
    }

    /// Addresses of every extracted object of this type, in heap walk order
    pub fn objects(&self) -> impl Iterator<Item = Address> + '_ {
        self.objects.iter().map(|(_, address)| *address)
    }

    /// Number of extracted objects of this type
    pub fn object_count(&self) -> usize {
        self.objects.count()
    }

    pub(crate) fn add_object(&self, address: Address) {
        self.objects.push(address);
    }

    /// Returns true for interface types
    pub fn is_interface(&self) -> bool {
        self.flags.contains(TypeFlags::INTERFACE)
    }

    /// Returns true for array types
    pub fn is_array(&self) -> bool {
        self.flags.contains(TypeFlags::ARRAY)
    }

    /// Returns true for System.String
    pub fn is_string(&self) -> bool {
        self.flags.contains(TypeFlags::STRING)
    }

    /// Returns true for exception types
    pub fn is_exception(&self) -> bool {
        self.flags.contains(TypeFlags::EXCEPTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_identity() {
        let a = DumpTypeKey::new(0x10, "Contoso.Order");
        let b = DumpTypeKey::new(0x10, "Contoso.Order");
        let other_domain = DumpTypeKey::new(0x20, "Contoso.Order");

        assert_eq!(a, b);
        assert_ne!(a, other_domain);

        let set: HashSet<_> = [a, b, other_domain].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_key_allows_zero_and_empty() {
        let key = DumpTypeKey::new(0, "");
        assert_eq!(key.method_table, 0);
        assert!(key.name.is_empty());
    }

    #[test]
    fn test_key_display() {
        let key = DumpTypeKey::new(0x7ff8_1234, "System.String");
        assert_eq!(key.to_string(), "System.String (mt: 0x7ff81234)");
    }

    #[test]
    fn test_base_set_once() {
        let ty = DumpType::new(
            DumpTypeKey::new(0x30, "Contoso.Child"),
            Some(Address(0x4000)),
            24,
            TypeFlags::SEALED,
        );
        assert!(ty.base().is_none());
        assert!(ty.set_base(DumpTypeKey::new(0x28, "Contoso.Parent")));
        assert!(!ty.set_base(DumpTypeKey::new(0x08, "System.Object")));
        assert_eq!(ty.base().map(|k| k.name.as_str()), Some("Contoso.Parent"));
    }

    #[test]
    fn test_objects_and_flags() {
        let ty = DumpType::new(
            DumpTypeKey::new(0x40, "System.String"),
            None,
            22,
            TypeFlags::STRING | TypeFlags::SEALED,
        );
        ty.add_object(Address(0x100));
        ty.add_object(Address(0x200));

        assert_eq!(ty.object_count(), 2);
        assert_eq!(
            ty.objects().collect::<Vec<_>>(),
            vec![Address(0x100), Address(0x200)]
        );
        assert!(ty.is_string());
        assert!(!ty.is_array());
        assert_eq!(ty.name(), "System.String");
        assert_eq!(ty.method_table(), 0x40);
    }
}
