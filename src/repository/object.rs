//! Object and GC root lookups.

use std::collections::HashMap;

use crossbeam_skiplist::SkipMap;

use crate::{
    model::{Address, DumpObjectRc, DumpObjectRootRc},
    Error, Result,
};

/// Read access to the heap objects and GC roots of a snapshot.
///
/// Objects and roots are both keyed by address and iterate in address order.
/// Every iteration walks the frozen store again, so iterators can be recreated
/// at any time and always yield the same sequence.
pub struct DumpObjectRepository {
    objects: SkipMap<Address, DumpObjectRc>,
    roots: SkipMap<Address, DumpObjectRootRc>,
    /// rooted object address -> root slot addresses
    rooted_by: HashMap<Address, Vec<Address>>,
}

impl DumpObjectRepository {
    pub(crate) fn new(
        objects: SkipMap<Address, DumpObjectRc>,
        roots: SkipMap<Address, DumpObjectRootRc>,
    ) -> Self {
        let mut rooted_by: HashMap<Address, Vec<Address>> = HashMap::new();
        for entry in roots.iter() {
            if let Some(object) = entry.value().rooted_object {
                rooted_by.entry(object).or_default().push(*entry.key());
            }
        }

        DumpObjectRepository {
            objects,
            roots,
            rooted_by,
        }
    }

    /// Look up the object at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ObjectNotFound`] if no object was captured at `address`.
    pub fn get(&self, address: Address) -> Result<DumpObjectRc> {
        self.objects
            .get(&address)
            .map(|entry| entry.value().clone())
            .ok_or(Error::ObjectNotFound(address))
    }

    /// Returns true if an object was captured at `address`
    pub fn contains(&self, address: Address) -> bool {
        self.objects.contains_key(&address)
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the snapshot holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate all objects in address order.
    pub fn objects(&self) -> impl Iterator<Item = DumpObjectRc> + '_ {
        self.objects.iter().map(|entry| entry.value().clone())
    }

    /// Iterate the objects whose address lies in `start..end`.
    pub fn range(&self, start: Address, end: Address) -> impl Iterator<Item = DumpObjectRc> + '_ {
        self.objects
            .range(start..end)
            .map(|entry| entry.value().clone())
    }

    /// Resolve the outbound references of the object at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ObjectNotFound`] if no object was captured at `address`.
    pub fn references_of(&self, address: Address) -> Result<Vec<DumpObjectRc>> {
        let object = self.get(address)?;
        Ok(object
            .references()
            .filter_map(|child| self.objects.get(&child).map(|e| e.value().clone()))
            .collect())
    }

    /// Resolve the objects that reference the object at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ObjectNotFound`] if no object was captured at `address`.
    pub fn referencers_of(&self, address: Address) -> Result<Vec<DumpObjectRc>> {
        let object = self.get(address)?;
        Ok(object
            .referencers()
            .filter_map(|parent| self.objects.get(&parent).map(|e| e.value().clone()))
            .collect())
    }

    /// Look up the GC root whose slot lives at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RootNotFound`] if the root walk reported no such slot.
    pub fn get_root(&self, address: Address) -> Result<DumpObjectRootRc> {
        self.roots
            .get(&address)
            .map(|entry| entry.value().clone())
            .ok_or(Error::RootNotFound(address))
    }

    /// Iterate all GC roots in slot address order.
    pub fn roots(&self) -> impl Iterator<Item = DumpObjectRootRc> + '_ {
        self.roots.iter().map(|entry| entry.value().clone())
    }

    /// Number of GC roots
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// The roots that keep the object at `address` alive directly.
    pub fn roots_of(&self, address: Address) -> Vec<DumpObjectRootRc> {
        self.rooted_by
            .get(&address)
            .map(|slots| {
                slots
                    .iter()
                    .filter_map(|slot| self.roots.get(slot).map(|e| e.value().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns true if at least one root points at the object at `address`
    pub fn is_rooted(&self, address: Address) -> bool {
        self.rooted_by.contains_key(&address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DumpObject, DumpObjectRoot, DumpTypeKey, GcRootKind, Generation, ObjectPayload, RootFlags,
    };
    use std::sync::Arc;

    fn repository() -> DumpObjectRepository {
        let objects = SkipMap::new();
        for address in [0x300, 0x100, 0x200] {
            objects.insert(
                Address(address),
                Arc::new(DumpObject::new(
                    Address(address),
                    DumpTypeKey::new(0x10, "Contoso.Node"),
                    24,
                    Generation::Gen1,
                    ObjectPayload::None,
                    "default",
                )),
            );
        }
        objects
            .get(&Address(0x100))
            .unwrap()
            .value()
            .add_reference(Address(0x200));
        objects
            .get(&Address(0x200))
            .unwrap()
            .value()
            .add_referencer(Address(0x100));

        let roots = SkipMap::new();
        let mut root = DumpObjectRoot::new(
            Address(0x50),
            "static var Contoso.Cache.Instance",
            GcRootKind::StaticVar,
            RootFlags::empty(),
            Address(0x100),
        );
        root.rooted_object = Some(Address(0x100));
        roots.insert(Address(0x50), Arc::new(root));

        DumpObjectRepository::new(objects, roots)
    }

    #[test]
    fn test_lookup_and_not_found() {
        let repository = repository();
        let object = repository.get(Address(0x200)).unwrap();
        assert_eq!(object.address, Address(0x200));
        assert!(repository.contains(Address(0x300)));

        match repository.get(Address(0x999)) {
            Err(Error::ObjectNotFound(address)) => assert_eq!(address, Address(0x999)),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            repository.get_root(Address(0x51)),
            Err(Error::RootNotFound(_))
        ));
    }

    #[test]
    fn test_iteration_is_ordered_and_restartable() {
        let repository = repository();
        let first: Vec<Address> = repository.objects().map(|o| o.address).collect();
        let second: Vec<Address> = repository.objects().map(|o| o.address).collect();
        assert_eq!(first, vec![Address(0x100), Address(0x200), Address(0x300)]);
        assert_eq!(first, second);
        assert_eq!(repository.range(Address(0x100), Address(0x300)).count(), 2);
    }

    #[test]
    fn test_edges_resolve_to_objects() {
        let repository = repository();
        let children = repository.references_of(Address(0x100)).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].address, Address(0x200));

        let parents = repository.referencers_of(Address(0x200)).unwrap();
        assert_eq!(parents[0].address, Address(0x100));
        assert!(repository.referencers_of(Address(0x300)).unwrap().is_empty());
    }

    #[test]
    fn test_roots_by_object() {
        let repository = repository();
        assert_eq!(repository.root_count(), 1);
        assert!(repository.is_rooted(Address(0x100)));
        assert!(!repository.is_rooted(Address(0x200)));
        let roots = repository.roots_of(Address(0x100));
        assert_eq!(roots.len(), 1);
        assert!(roots[0].is_static_variable());
    }
}
