//! Entity definitions of the dump graph.
//!
//! Every entity is identified by a key (an [`Address`], a [`DumpTypeKey`] or an
//! OS thread id) and refers to other entities exclusively through such keys.
//! Entities are shared as `Arc`s between the construction passes and the
//! repositories; the few containers that are filled after creation (edge sets,
//! per-type object lists, module/domain links) are append-only concurrent
//! collections, so no entity ever needs `&mut` access once published.
//!
//! # Key Components
//!
//! - [`DumpObject`] - A live heap object and its reference edges
//! - [`DumpType`] - A loaded type, keyed by [`DumpTypeKey`]
//! - [`DumpModule`] / [`DumpAppDomain`] - Loaded modules and their domains
//! - [`DumpThread`] - An OS thread, its frames, roots and CPU times
//! - [`DumpObjectRoot`] - A GC root entry

mod address;
mod module;
mod object;
mod root;
mod thread;
mod types;

use std::sync::Arc;

pub use address::Address;
pub use module::{DumpAppDomain, DumpModule};
pub use object::{DumpObject, Generation, ObjectPayload, SHORT_DESCRIPTION_PREVIEW};
pub use root::{DumpObjectRoot, GcRootKind, RootFlags};
pub use thread::{DumpStackFrame, DumpThread, FrameKind};
pub use types::{DumpType, DumpTypeKey, TypeFlags};

/// Reference to a `DumpObject`
pub type DumpObjectRc = Arc<DumpObject>;
/// Reference to a `DumpType`
pub type DumpTypeRc = Arc<DumpType>;
/// Reference to a `DumpModule`
pub type DumpModuleRc = Arc<DumpModule>;
/// Reference to a `DumpAppDomain`
pub type DumpAppDomainRc = Arc<DumpAppDomain>;
/// Reference to a `DumpThread`
pub type DumpThreadRc = Arc<DumpThread>;
/// Reference to a `DumpObjectRoot`
pub type DumpObjectRootRc = Arc<DumpObjectRoot>;
