use std::{fmt, time::Duration};

/// Counters collected while building the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Modules in the module store
    pub modules: usize,
    /// Domains in the domain store
    pub app_domains: usize,
    /// Types in the type store
    pub types: usize,
    /// Types whose base type was not found among the loaded types
    pub unresolved_base_types: usize,
    /// Objects in the object store
    pub objects: usize,
    /// Null or free heap slots that were skipped
    pub free_skipped: usize,
    /// Objects excluded because of an error
    pub objects_excluded: usize,
    /// Objects produced by the fallback after a type-specific extractor failed
    pub extractor_fallbacks: usize,
    /// Reference edges established
    pub edges_linked: usize,
    /// Reference edges dropped because the target was not in the object store
    pub edges_missing: usize,
    /// Roots in the root store
    pub roots: usize,
    /// Roots left out by the root walk policy
    pub roots_filtered: usize,
    /// Roots claimed by a thread but absent from the root store
    pub thread_roots_dropped: usize,
    /// Threads in the thread store
    pub threads: usize,
    /// Threads dropped because their OS id was already taken
    pub duplicate_threads: usize,
    /// Timing lines applied to a thread
    pub thread_times: usize,
    /// Wall-clock time of the construction
    pub elapsed: Duration,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} objects, {} types, {} modules, {} app domains, {} threads, {} roots",
            self.objects, self.types, self.modules, self.app_domains, self.threads, self.roots
        )?;
        writeln!(
            f,
            "{} edges linked, {} missing; {} extractor fallbacks; {} objects excluded",
            self.edges_linked, self.edges_missing, self.extractor_fallbacks, self.objects_excluded
        )?;
        write!(f, "built in {:.3}s", self.elapsed.as_secs_f64())
    }
}
