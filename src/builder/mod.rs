//! Construction of the dump graph.
//!
//! [`RepositoryFactory`] drives a [`RuntimeInspector`] through a fixed sequence of
//! passes and wraps the resulting stores in [`DumpRepositories`]:
//!
//! 1. **Snapshot info**: minidumps and unwalkable heaps are reported up front
//! 2. **Modules and types**: modules, app domains and types, base types linked late
//! 3. **Objects**: every live object goes through the extractor registry; references
//!    are recorded in an adjacency map instead of on the objects
//! 4. **Roots**: the global root walk, filtered by the [`RootWalkPolicy`]
//! 5. **Linking**: the adjacency map becomes bidirectional edges, see [`crate::linker`]
//! 6. **Threads**: frames, stack roots joined against the global roots, CPU times
//!
//! The passes themselves are single-threaded; only linking may run on the rayon
//! pool. A failing top-level enumeration or a structural defect aborts the build
//! and no partial graph is returned. Anything smaller is logged to the
//! [`crate::diagnostics::Diagnostics`] of the result and skipped.
//!
//! [`RootWalkPolicy`]: crate::config::RootWalkPolicy

pub(crate) mod context;
mod modules;
mod objects;
pub mod runaway;
mod stats;
mod threads;

use std::time::Instant;

pub use stats::BuildStats;

use crate::{
    builder::context::BuildContext,
    config::BuildConfig,
    diagnostics::DiagnosticCategory,
    extraction::{ExtractorRegistry, ObjectExtractor},
    inspector::RuntimeInspector,
    linker::GraphLinker,
    repository::DumpRepositories,
    Result,
};

/// Builder that constructs [`DumpRepositories`] from a runtime inspector.
///
/// The factory starts with the built-in extractors
/// ([`ExtractorRegistry::with_defaults`]); extractors added with
/// [`RepositoryFactory::with_extractor`] are consulted after them, in the order
/// they were added.
///
/// # Usage Examples
///
/// ```rust
/// use dumpgraph::{
///     builder::RepositoryFactory,
///     config::BuildConfig,
///     extraction::TypeExtractor,
///     inspector::{ModuleDescriptor, ObjectDescriptor, SyntheticSnapshot, TypeDescriptor},
///     model::{Address, DumpTypeKey, ObjectPayload},
/// };
///
/// let order = DumpTypeKey::new(0x200, "Contoso.Order");
/// let mut snapshot = SyntheticSnapshot::new();
/// snapshot
///     .add_module(ModuleDescriptor::new(Address(0x4000), "Contoso.dll"), &[])
///     .add_type(Address(0x4000), TypeDescriptor::new(0x200, "Contoso.Order"))
///     .add_object(ObjectDescriptor::new(Address(0x1000), &order, 48));
///
/// let repos = RepositoryFactory::new(&snapshot)
///     .with_config(BuildConfig::sequential())
///     .with_extractor(TypeExtractor::exact("order", "Contoso.Order", |_, _| {
///         Ok(ObjectPayload::Text("pending".into()))
///     }))
///     .build()?;
///
/// let object = repos.get_object(Address(0x1000))?;
/// assert_eq!(object.extractor, "order");
/// assert_eq!(repos.stats().objects, 1);
/// # Ok::<(), dumpgraph::Error>(())
/// ```
pub struct RepositoryFactory<I: RuntimeInspector> {
    /// Source of all snapshot data
    inspector: I,
    /// Settings of the construction run
    config: BuildConfig,
    /// Extraction strategies, consulted in order
    registry: ExtractorRegistry,
}

impl<I: RuntimeInspector> RepositoryFactory<I> {
    /// Create a factory with the default configuration and the built-in extractors.
    #[must_use]
    pub fn new(inspector: I) -> Self {
        Self {
            inspector,
            config: BuildConfig::default(),
            registry: ExtractorRegistry::with_defaults(),
        }
    }

    /// Replace the construction settings.
    #[must_use]
    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Append an extraction strategy.
    #[must_use]
    pub fn with_extractor<E: ObjectExtractor + 'static>(mut self, extractor: E) -> Self {
        self.registry.register(extractor);
        self
    }

    /// Append several boxed extraction strategies, keeping their order.
    #[must_use]
    pub fn with_extractors<T>(mut self, extractors: T) -> Self
    where
        T: IntoIterator<Item = Box<dyn ObjectExtractor>>,
    {
        for extractor in extractors {
            self.registry.register_boxed(extractor);
        }
        self
    }

    /// Replace the whole registry, built-in extractors included.
    #[must_use]
    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Run every construction pass and hand out the repositories.
    ///
    /// # Errors
    ///
    /// Returns an error if the inspector fails a top-level enumeration (modules,
    /// objects, roots or threads), or, with [`BuildConfig::strict`] set, if an
    /// object names an unknown type or two objects share an address.
    pub fn build(self) -> Result<DumpRepositories> {
        let started = Instant::now();
        let span = tracing::info_span!("build", config = ?self.config);
        let _guard = span.enter();

        let info = self.inspector.snapshot_info()?;
        tracing::info!(
            pointer_size = info.pointer_size,
            runtime = info.runtime_version.as_deref().unwrap_or("unknown"),
            extractors = ?self.registry.names().collect::<Vec<_>>(),
            "building dump graph"
        );

        let mut ctx = BuildContext::new(&self.inspector, self.config);

        if info.is_minidump {
            ctx.warning(
                DiagnosticCategory::General,
                None,
                "snapshot is a minidump, heap contents may be incomplete",
            );
        }
        if !info.can_walk_heap {
            ctx.warning(
                DiagnosticCategory::General,
                None,
                "heap is not in a walkable state, objects and references may be missing",
            );
        }

        modules::build_modules_and_types(&mut ctx)?;
        let adjacency = objects::build_objects(&mut ctx, &self.registry)?;
        objects::build_roots(&mut ctx)?;

        let link = GraphLinker::new(
            &ctx.stores.objects,
            &ctx.diagnostics,
            ctx.config.parallel_linking,
        )
        .link(adjacency);
        ctx.stats.edges_linked = link.linked;
        ctx.stats.edges_missing = link.missing;

        threads::build_threads(&mut ctx)?;

        let BuildContext {
            diagnostics,
            mut stats,
            stores,
            ..
        } = ctx;
        stats.elapsed = started.elapsed();

        tracing::info!(
            objects = stats.objects,
            edges = stats.edges_linked,
            diagnostics = diagnostics.count(),
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "dump graph built"
        );

        Ok(DumpRepositories::new(stores, diagnostics, stats, info))
    }
}
