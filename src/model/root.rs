//! GC root entries.

use std::{fmt, sync::OnceLock};

use bitflags::bitflags;
use strum::{EnumCount, EnumIter};

use crate::model::Address;

/// The kind of a GC root, as classified by the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum GcRootKind {
    /// A static variable
    StaticVar,
    /// A thread-static variable
    ThreadStaticVar,
    /// A local variable or stack slot
    LocalVar,
    /// A strong handle
    Strong,
    /// A weak handle
    Weak,
    /// A strong pinning handle
    Pinning,
    /// An object waiting on the finalizer queue
    Finalizer,
    /// A handle pinning a buffer for asynchronous I/O
    AsyncPinning,
}

impl fmt::Display for GcRootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GcRootKind::StaticVar => "static var",
            GcRootKind::ThreadStaticVar => "thread static var",
            GcRootKind::LocalVar => "local var",
            GcRootKind::Strong => "strong handle",
            GcRootKind::Weak => "weak handle",
            GcRootKind::Pinning => "pinning handle",
            GcRootKind::Finalizer => "finalizer queue",
            GcRootKind::AsyncPinning => "async pinning handle",
        };
        f.write_str(text)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    /// Additional root properties reported by the stack walk
    pub struct RootFlags: u8 {
        /// The root points into the middle of an object
        const INTERIOR = 0x01;
        /// The root pins its object
        const PINNED = 0x02;
        /// The slot might not actually be a live reference (conservative walk)
        const POSSIBLE_FALSE_POSITIVE = 0x04;
    }
}

/// A GC root entry.
///
/// Roots are extracted once for the whole process. The owning thread is filled in
/// by the thread pass when a thread's stack walk claims the root.
#[derive(Debug)]
pub struct DumpObjectRoot {
    /// Address of the root slot; store key
    pub address: Address,
    /// Descriptive name reported by the runtime
    pub name: String,
    /// Classification of the root
    pub kind: GcRootKind,
    /// Additional root properties
    pub flags: RootFlags,
    /// The address the root points at
    pub object_address: Address,
    /// The rooted object, absent if the address was not among the extracted objects
    pub rooted_object: Option<Address>,
    /// Address of the owning application domain, if known
    pub app_domain: Option<Address>,
    thread: OnceLock<u32>,
}

impl DumpObjectRoot {
    /// Create a new root without owning thread
    pub fn new(
        address: Address,
        name: impl Into<String>,
        kind: GcRootKind,
        flags: RootFlags,
        object_address: Address,
    ) -> Self {
        DumpObjectRoot {
            address,
            name: name.into(),
            kind,
            flags,
            object_address,
            rooted_object: None,
            app_domain: None,
            thread: OnceLock::new(),
        }
    }

    /// OS id of the thread whose stack holds this root
    pub fn thread(&self) -> Option<u32> {
        self.thread.get().copied()
    }

    /// Claims this root for a thread. Returns `false` if another thread owns it.
    pub(crate) fn claim(&self, os_id: u32) -> bool {
        self.thread.set(os_id).is_ok() || self.thread() == Some(os_id)
    }

    /// Strong handle root
    pub fn is_strong_handle(&self) -> bool {
        self.kind == GcRootKind::Strong
    }

    /// Weak handle root
    pub fn is_weak_handle(&self) -> bool {
        self.kind == GcRootKind::Weak
    }

    /// Strong pinning handle root
    pub fn is_strong_pinning_handle(&self) -> bool {
        self.kind == GcRootKind::Pinning
    }

    /// Async I/O pinning root
    pub fn is_async_io_pinning(&self) -> bool {
        self.kind == GcRootKind::AsyncPinning
    }

    /// Static variable root
    pub fn is_static_variable(&self) -> bool {
        self.kind == GcRootKind::StaticVar
    }

    /// Thread-static variable root
    pub fn is_thread_static_variable(&self) -> bool {
        self.kind == GcRootKind::ThreadStaticVar
    }

    /// Local variable root
    pub fn is_local_var(&self) -> bool {
        self.kind == GcRootKind::LocalVar
    }

    /// Finalizer queue root
    pub fn is_finalizer_queue(&self) -> bool {
        self.kind == GcRootKind::Finalizer
    }

    /// Root points into the interior of an object
    pub fn is_interior_pointer(&self) -> bool {
        self.flags.contains(RootFlags::INTERIOR)
    }

    /// Root pins its object
    pub fn is_pinned(&self) -> bool {
        self.flags.contains(RootFlags::PINNED)
    }

    /// Root may be a false positive of a conservative stack walk
    pub fn is_possible_false_positive(&self) -> bool {
        self.flags.contains(RootFlags::POSSIBLE_FALSE_POSITIVE)
    }
}
