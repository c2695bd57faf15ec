//! Raw records handed out by a [`super::RuntimeInspector`].
//!
//! Descriptors are plain owned values. They carry what the inspector knows about
//! an entity at the time of enumeration and are turned into model entities by the
//! construction passes.

use crate::model::{Address, DumpTypeKey, GcRootKind, Generation, RootFlags, TypeFlags};

/// Snapshot-level facts reported before construction starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotInfo {
    /// The snapshot was captured without full memory; heap data may be missing
    pub is_minidump: bool,
    /// The inspector can walk the GC heap consistently
    pub can_walk_heap: bool,
    /// Pointer size of the captured process in bytes
    pub pointer_size: u32,
    /// Version of the managed runtime, if known
    pub runtime_version: Option<String>,
}

impl Default for SnapshotInfo {
    fn default() -> Self {
        SnapshotInfo {
            is_minidump: false,
            can_walk_heap: true,
            pointer_size: 8,
            runtime_version: None,
        }
    }
}

/// An application domain as reported by the inspector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppDomainDescriptor {
    /// Address of the domain
    pub address: Address,
    /// Friendly name
    pub name: Option<String>,
    /// Configuration file path
    pub config_file: Option<String>,
    /// Application base directory
    pub application_base: Option<String>,
}

impl AppDomainDescriptor {
    /// Create a domain descriptor with only a name
    pub fn new(address: Address, name: impl Into<String>) -> Self {
        AppDomainDescriptor {
            address,
            name: Some(name.into()),
            config_file: None,
            application_base: None,
        }
    }
}

/// A loaded module as reported by the inspector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Runtime handle of the module; always set
    pub handle: Address,
    /// Image base address, [`Address::NULL`] for modules without an image
    pub image_base: Address,
    /// Module name
    pub name: String,
    /// Path of the file the module was loaded from
    pub file_name: Option<String>,
    /// Runtime assembly identifier
    pub assembly_id: u64,
    /// Name of the assembly containing the module
    pub assembly_name: Option<String>,
    /// Module was emitted at runtime
    pub is_dynamic: bool,
    /// Raw debugging-mode flags
    pub debugging_mode: u32,
    /// Domains the module is loaded into
    pub app_domains: Vec<AppDomainDescriptor>,
}

impl ModuleDescriptor {
    /// Create a module descriptor loaded from an image at `image_base`
    pub fn new(image_base: Address, name: impl Into<String>) -> Self {
        ModuleDescriptor {
            handle: image_base,
            image_base,
            name: name.into(),
            file_name: None,
            assembly_id: 0,
            assembly_name: None,
            is_dynamic: false,
            debugging_mode: 0,
            app_domains: Vec::new(),
        }
    }

    /// The address the module is stored under
    ///
    /// Modules without an image (dynamic modules) are keyed by their handle.
    pub fn key(&self) -> Address {
        if self.image_base.is_null() {
            self.handle
        } else {
            self.image_base
        }
    }
}

/// A loaded type as reported by the inspector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Runtime identity token (method table)
    pub method_table: u64,
    /// Display name; runtime-internal types may be unnamed
    pub name: Option<String>,
    /// Key of the base type, if any
    pub base: Option<DumpTypeKey>,
    /// Base instance size in bytes
    pub base_size: u64,
    /// Classification flags
    pub flags: TypeFlags,
}

impl TypeDescriptor {
    /// Create a named type descriptor without base type
    pub fn new(method_table: u64, name: impl Into<String>) -> Self {
        TypeDescriptor {
            method_table,
            name: Some(name.into()),
            base: None,
            base_size: 0,
            flags: TypeFlags::empty(),
        }
    }

    /// The type key, or `None` for unnamed types
    pub fn key(&self) -> Option<DumpTypeKey> {
        self.name
            .as_ref()
            .map(|name| DumpTypeKey::new(self.method_table, name.clone()))
    }
}

/// A raw heap object as reported by the inspector.
///
/// This is the descriptor extractors inspect to decide whether they apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// Address of the object
    pub address: Address,
    /// Method table of the object's type
    pub method_table: u64,
    /// Display name of the object's type, if the inspector could resolve it
    pub type_name: Option<String>,
    /// Size of the object in bytes
    pub size: u64,
    /// GC generation
    pub generation: Generation,
    /// The slot is a free block of the heap, not an object
    pub is_free: bool,
}

impl ObjectDescriptor {
    /// Create a live object descriptor in generation 0
    pub fn new(address: Address, type_key: &DumpTypeKey, size: u64) -> Self {
        ObjectDescriptor {
            address,
            method_table: type_key.method_table,
            type_name: Some(type_key.name.clone()),
            size,
            generation: Generation::Gen0,
            is_free: false,
        }
    }

    /// The type key, or `None` if the type name could not be resolved
    pub fn type_key(&self) -> Option<DumpTypeKey> {
        self.type_name
            .as_ref()
            .map(|name| DumpTypeKey::new(self.method_table, name.clone()))
    }

    /// Returns true if the type name equals `name`
    pub fn is_type(&self, name: &str) -> bool {
        self.type_name.as_deref() == Some(name)
    }
}

/// A GC root as reported by the inspector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootDescriptor {
    /// Address of the root slot
    pub address: Address,
    /// Descriptive name
    pub name: String,
    /// Root classification
    pub kind: GcRootKind,
    /// Root properties
    pub flags: RootFlags,
    /// Address the root points at
    pub object: Address,
    /// Owning domain, if known
    pub app_domain: Option<Address>,
}

impl RootDescriptor {
    /// Create a stack root descriptor
    pub fn local(address: Address, object: Address) -> Self {
        RootDescriptor {
            address,
            name: "local var".to_string(),
            kind: GcRootKind::LocalVar,
            flags: RootFlags::empty(),
            object,
            app_domain: None,
        }
    }
}

/// An OS thread as reported by the inspector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadDescriptor {
    /// OS thread id
    pub os_id: u32,
    /// Managed thread id
    pub managed_thread_id: u32,
    /// Address of the runtime thread object
    pub address: Address,
    /// Domain the thread is running in
    pub app_domain: Option<Address>,
    /// Thread is the finalizer thread
    pub is_finalizer: bool,
    /// Thread is a background thread
    pub is_background: bool,
}

impl ThreadDescriptor {
    /// Create a thread descriptor
    pub fn new(os_id: u32, managed_thread_id: u32) -> Self {
        ThreadDescriptor {
            os_id,
            managed_thread_id,
            ..Default::default()
        }
    }
}
