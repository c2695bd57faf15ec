//! Read-only repositories over a constructed dump graph.
//!
//! [`DumpRepositories`] is the single value handed out by
//! [`crate::builder::RepositoryFactory::build`]. It owns every entity store and
//! exposes them through one repository per entity kind. Nothing in this module
//! mutates a store; all lookups take `&self` and the whole set is `Send + Sync`,
//! so analyzers can share it across threads without further synchronization.
//!
//! # Key Components
//!
//! - [`DumpObjectRepository`] - Objects and GC roots by address
//! - [`DumpTypeRepository`] - Types by key and by display name
//! - [`DumpModuleRepository`] / [`DumpAppDomainRepository`] - Modules and domains by address
//! - [`DumpThreadRepository`] - Threads by OS id
//!
//! # Examples
//!
//! ```rust
//! use dumpgraph::{builder::RepositoryFactory, inspector::SyntheticSnapshot, model::Address};
//!
//! let snapshot = SyntheticSnapshot::new();
//! let repos = RepositoryFactory::new(&snapshot).build()?;
//!
//! assert!(repos.objects().is_empty());
//! assert!(repos.get_object(Address(0x1000)).is_err());
//! # Ok::<(), dumpgraph::Error>(())
//! ```

mod module;
mod object;
mod thread;
mod types;

use std::sync::Arc;

pub use module::{DumpAppDomainRepository, DumpModuleRepository};
pub use object::DumpObjectRepository;
pub use thread::DumpThreadRepository;
pub use types::DumpTypeRepository;

use crate::{
    builder::{context::Stores, BuildStats},
    diagnostics::Diagnostics,
    inspector::SnapshotInfo,
    model::{
        Address, DumpAppDomainRc, DumpModuleRc, DumpObjectRc, DumpThreadRc, DumpTypeKey,
        DumpTypeRc,
    },
    Result,
};

/// The complete set of repositories of one snapshot.
pub struct DumpRepositories {
    objects: DumpObjectRepository,
    types: DumpTypeRepository,
    modules: DumpModuleRepository,
    app_domains: DumpAppDomainRepository,
    threads: DumpThreadRepository,
    diagnostics: Arc<Diagnostics>,
    stats: BuildStats,
    info: SnapshotInfo,
}

impl DumpRepositories {
    pub(crate) fn new(
        stores: Stores,
        diagnostics: Arc<Diagnostics>,
        stats: BuildStats,
        info: SnapshotInfo,
    ) -> Self {
        let Stores {
            objects,
            roots,
            types,
            modules,
            app_domains,
            threads,
        } = stores;

        DumpRepositories {
            objects: DumpObjectRepository::new(objects, roots),
            types: DumpTypeRepository::new(types),
            modules: DumpModuleRepository::new(modules),
            app_domains: DumpAppDomainRepository::new(app_domains),
            threads: DumpThreadRepository::new(threads),
            diagnostics,
            stats,
            info,
        }
    }

    /// Objects and GC roots
    pub fn objects(&self) -> &DumpObjectRepository {
        &self.objects
    }

    /// Types
    pub fn types(&self) -> &DumpTypeRepository {
        &self.types
    }

    /// Modules
    pub fn modules(&self) -> &DumpModuleRepository {
        &self.modules
    }

    /// Application domains
    pub fn app_domains(&self) -> &DumpAppDomainRepository {
        &self.app_domains
    }

    /// Threads
    pub fn threads(&self) -> &DumpThreadRepository {
        &self.threads
    }

    /// Everything that was logged and skipped during construction
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// Counters of the construction run
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Facts about the snapshot reported by the inspector
    pub fn info(&self) -> &SnapshotInfo {
        &self.info
    }

    /// Shorthand for `objects().get(address)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ObjectNotFound`] if no object lives at `address`.
    pub fn get_object(&self, address: Address) -> Result<DumpObjectRc> {
        self.objects.get(address)
    }

    /// Shorthand for `types().get(key)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TypeNotFound`] if no type has this key.
    pub fn get_type(&self, key: &DumpTypeKey) -> Result<DumpTypeRc> {
        self.types.get(key)
    }

    /// Shorthand for `modules().get(address)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ModuleNotFound`] if no module is stored under `address`.
    pub fn get_module(&self, address: Address) -> Result<DumpModuleRc> {
        self.modules.get(address)
    }

    /// Shorthand for `app_domains().get(address)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AppDomainNotFound`] if no domain exists at `address`.
    pub fn get_app_domain(&self, address: Address) -> Result<DumpAppDomainRc> {
        self.app_domains.get(address)
    }

    /// Shorthand for `threads().get(os_id)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ThreadNotFound`] if no thread has this OS id.
    pub fn get_thread(&self, os_id: u32) -> Result<DumpThreadRc> {
        self.threads.get(os_id)
    }

    /// The type record of `object`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TypeNotFound`] if the object's type is unknown,
    /// which only happens for graphs built with [`crate::config::BuildConfig::lenient`].
    pub fn type_of(&self, object: &DumpObjectRc) -> Result<DumpTypeRc> {
        self.types.get(&object.type_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_repositories_are_shareable() {
        assert_send_sync::<DumpRepositories>();
    }

    #[test]
    fn test_empty_repositories() {
        let repos = DumpRepositories::new(
            Stores::default(),
            Arc::new(Diagnostics::new()),
            BuildStats::default(),
            SnapshotInfo::default(),
        );
        assert!(repos.objects().is_empty());
        assert!(repos.types().is_empty());
        assert!(repos.modules().is_empty());
        assert!(repos.app_domains().is_empty());
        assert!(repos.threads().is_empty());
        assert!(repos.get_thread(1).is_err());
        assert_eq!(repos.info().pointer_size, 8);
    }
}
