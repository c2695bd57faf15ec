//! Type lookups.
//!
//! Types are stored under their full [`DumpTypeKey`]; a name can map to several
//! keys when distinct runtime types share a display name (generic instantiations
//! in different domains, types loaded twice from different paths). The name index
//! keeps those apart and resolves a name to every type carrying it.

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    model::{Address, DumpTypeKey, DumpTypeRc},
    Error, Result,
};

/// Read access to the types of a snapshot.
pub struct DumpTypeRepository {
    types: SkipMap<DumpTypeKey, DumpTypeRc>,
    types_by_name: DashMap<String, Vec<DumpTypeKey>>,
}

impl DumpTypeRepository {
    pub(crate) fn new(types: SkipMap<DumpTypeKey, DumpTypeRc>) -> Self {
        let types_by_name: DashMap<String, Vec<DumpTypeKey>> = DashMap::new();
        for entry in types.iter() {
            types_by_name
                .entry(entry.key().name.clone())
                .or_default()
                .push(entry.key().clone());
        }

        DumpTypeRepository {
            types,
            types_by_name,
        }
    }

    /// Look up a type by key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeNotFound`] if no module defined a type with this key.
    pub fn get(&self, key: &DumpTypeKey) -> Result<DumpTypeRc> {
        self.types
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::TypeNotFound(key.clone()))
    }

    /// Returns true if a type with this key exists
    pub fn contains(&self, key: &DumpTypeKey) -> bool {
        self.types.contains_key(key)
    }

    /// Every type carrying the display name `name`
    pub fn by_name(&self, name: &str) -> Vec<DumpTypeRc> {
        self.types_by_name
            .get(name)
            .map(|keys| {
                keys.iter()
                    .filter_map(|key| self.types.get(key).map(|e| e.value().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every type defined by the module stored under `module`
    pub fn by_module(&self, module: Address) -> Vec<DumpTypeRc> {
        self.types()
            .filter(|ty| ty.module == Some(module))
            .collect()
    }

    /// Iterate all types in key order.
    pub fn types(&self) -> impl Iterator<Item = DumpTypeRc> + '_ {
        self.types.iter().map(|entry| entry.value().clone())
    }

    /// Number of types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types were loaded
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
