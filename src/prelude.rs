//! # dumpgraph Prelude
//!
//! The types needed to build a dump graph and query it, in one import.
//!
//! ```rust
//! use dumpgraph::prelude::*;
//!
//! let snapshot = SyntheticSnapshot::new();
//! let repos = RepositoryFactory::new(&snapshot)
//!     .with_config(BuildConfig::lenient())
//!     .build()?;
//! assert_eq!(repos.stats().objects, 0);
//! # Ok::<(), dumpgraph::Error>(())
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

pub use crate::{Error, Result};

pub use crate::config::{BuildConfig, RootWalkPolicy};

pub use crate::diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};

// ================================================================================================
// Construction
// ================================================================================================

pub use crate::builder::{BuildStats, RepositoryFactory};

pub use crate::inspector::{
    AppDomainDescriptor, ModuleDescriptor, ObjectDescriptor, RootDescriptor, RuntimeInspector,
    SnapshotInfo, SyntheticSnapshot, ThreadDescriptor, TypeDescriptor,
};

pub use crate::extraction::{ExtractorRegistry, ObjectExtractor, StringExtractor, TypeExtractor};

// ================================================================================================
// Graph Entities and Repositories
// ================================================================================================

pub use crate::model::{
    Address, DumpAppDomain, DumpModule, DumpObject, DumpObjectRoot, DumpStackFrame, DumpThread,
    DumpType, DumpTypeKey, FrameKind, GcRootKind, Generation, ObjectPayload, RootFlags, TypeFlags,
};

pub use crate::repository::{
    DumpAppDomainRepository, DumpModuleRepository, DumpObjectRepository, DumpRepositories,
    DumpThreadRepository, DumpTypeRepository,
};

pub use crate::analyzer::{frame_rollup, retention_path, unique_stacks};
