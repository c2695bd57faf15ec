//! The runtime inspector boundary.
//!
//! A [`RuntimeInspector`] exposes the primitive accessors of a process snapshot:
//! enumerating heap objects and their references, loaded modules and types,
//! threads with their stack frames and stack roots. Reading the snapshot file
//! itself is the inspector's business; construction only consumes these records.
//!
//! Construction calls every accessor at most once per entity, in a fixed order:
//! [`RuntimeInspector::snapshot_info`], modules and their types, objects and their
//! references, global roots, threads with frames and stack roots, and finally the
//! optional thread timing text.
//!
//! # Key Components
//!
//! - [`RuntimeInspector`] - The accessor trait
//! - [`descriptors`] - Raw records returned by the accessors
//! - [`SyntheticSnapshot`] - An in-memory inspector built by hand

pub mod descriptors;
mod synthetic;

use std::collections::HashSet;

pub use descriptors::{
    AppDomainDescriptor, ModuleDescriptor, ObjectDescriptor, RootDescriptor, SnapshotInfo,
    ThreadDescriptor, TypeDescriptor,
};
pub use synthetic::SyntheticSnapshot;

use crate::{
    config::RootWalkPolicy,
    model::{Address, DumpStackFrame},
    Error, Result,
};

/// Read access to a captured process.
///
/// Top-level enumerations (`enumerate_modules`, `enumerate_objects`,
/// `enumerate_roots`, `enumerate_threads`) failing aborts construction. Failures
/// of the per-entity accessors (`enumerate_types`, `enumerate_references`,
/// `enumerate_stack_frames`, `enumerate_stack_roots`, `read_string`) only affect
/// that entity.
pub trait RuntimeInspector {
    /// Snapshot-level facts; failing here means the snapshot cannot be used.
    fn snapshot_info(&self) -> Result<SnapshotInfo>;

    /// All loaded modules, including the domains each one is loaded into.
    fn enumerate_modules(&self) -> Result<Vec<ModuleDescriptor>>;

    /// All types defined by `module`.
    fn enumerate_types(&self, module: &ModuleDescriptor) -> Result<Vec<TypeDescriptor>>;

    /// All heap slots, including free blocks.
    ///
    /// Returned as an iterator so that heaps with millions of objects are never
    /// materialized as a whole.
    fn enumerate_objects(&self) -> Result<Box<dyn Iterator<Item = ObjectDescriptor> + '_>>;

    /// Addresses referenced by the object at `object`.
    fn enumerate_references(&self, object: Address) -> Result<Vec<Address>>;

    /// All threads that ran managed code.
    fn enumerate_threads(&self) -> Result<Vec<ThreadDescriptor>>;

    /// The display stack of `thread`, innermost frame first.
    fn enumerate_stack_frames(&self, _thread: &ThreadDescriptor) -> Result<Vec<DumpStackFrame>> {
        Ok(Vec::new())
    }

    /// GC roots found on the stack of `thread`.
    fn enumerate_stack_roots(&self, thread: &ThreadDescriptor) -> Result<Vec<RootDescriptor>>;

    /// Every GC root of the process, walking thread stacks as `policy` allows.
    ///
    /// The default walks all thread stacks and keeps the first occurrence of
    /// each root address. It reports nothing under [`RootWalkPolicy::SkipStack`].
    /// A thread whose stack cannot be walked contributes no roots; the thread
    /// pass reports that failure for the thread itself.
    fn enumerate_roots(&self, policy: RootWalkPolicy) -> Result<Vec<RootDescriptor>> {
        let mut seen = HashSet::new();
        let mut roots = Vec::new();
        if !policy.walks_stacks() {
            return Ok(roots);
        }

        for thread in self.enumerate_threads()? {
            let stack_roots = match self.enumerate_stack_roots(&thread) {
                Ok(stack_roots) => stack_roots,
                Err(e) => {
                    tracing::warn!(
                        os_id = thread.os_id,
                        error = %e,
                        "skipping stack roots of unwalkable thread"
                    );
                    continue;
                }
            };
            for root in stack_roots {
                if seen.insert(root.address) {
                    roots.push(root);
                }
            }
        }
        Ok(roots)
    }

    /// Reads the value of the string object at `address`.
    fn read_string(&self, _address: Address) -> Result<String> {
        Err(Error::NotSupported)
    }

    /// Per-thread CPU time text, see [`crate::builder::runaway`] for the format.
    fn thread_timing_text(&self) -> Option<String> {
        None
    }
}

impl<T: RuntimeInspector + ?Sized> RuntimeInspector for &T {
    fn snapshot_info(&self) -> Result<SnapshotInfo> {
        (**self).snapshot_info()
    }

    fn enumerate_modules(&self) -> Result<Vec<ModuleDescriptor>> {
        (**self).enumerate_modules()
    }

    fn enumerate_types(&self, module: &ModuleDescriptor) -> Result<Vec<TypeDescriptor>> {
        (**self).enumerate_types(module)
    }

    fn enumerate_objects(&self) -> Result<Box<dyn Iterator<Item = ObjectDescriptor> + '_>> {
        (**self).enumerate_objects()
    }

    fn enumerate_references(&self, object: Address) -> Result<Vec<Address>> {
        (**self).enumerate_references(object)
    }

    fn enumerate_threads(&self) -> Result<Vec<ThreadDescriptor>> {
        (**self).enumerate_threads()
    }

    fn enumerate_stack_frames(&self, thread: &ThreadDescriptor) -> Result<Vec<DumpStackFrame>> {
        (**self).enumerate_stack_frames(thread)
    }

    fn enumerate_stack_roots(&self, thread: &ThreadDescriptor) -> Result<Vec<RootDescriptor>> {
        (**self).enumerate_stack_roots(thread)
    }

    fn enumerate_roots(&self, policy: RootWalkPolicy) -> Result<Vec<RootDescriptor>> {
        (**self).enumerate_roots(policy)
    }

    fn read_string(&self, address: Address) -> Result<String> {
        (**self).read_string(address)
    }

    fn thread_timing_text(&self) -> Option<String> {
        (**self).thread_timing_text()
    }
}
