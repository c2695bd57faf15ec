//! An in-memory [`RuntimeInspector`] assembled by hand.
//!
//! [`SyntheticSnapshot`] answers every accessor from plain collections. It is
//! used to exercise construction without a real snapshot, and lets analyzer
//! authors fabricate small dumps for their own tests. Individual accessors can be
//! made to fail to simulate damaged snapshots.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    config::RootWalkPolicy,
    inspector::{
        AppDomainDescriptor, ModuleDescriptor, ObjectDescriptor, RootDescriptor,
        RuntimeInspector, SnapshotInfo, ThreadDescriptor, TypeDescriptor,
    },
    model::{Address, DumpStackFrame},
    Error, Result,
};

/// A snapshot built from explicitly added records.
///
/// # Examples
///
/// ```rust
/// use dumpgraph::inspector::{
///     AppDomainDescriptor, ModuleDescriptor, ObjectDescriptor, SyntheticSnapshot, TypeDescriptor,
/// };
/// use dumpgraph::model::{Address, DumpTypeKey};
///
/// let mut snapshot = SyntheticSnapshot::new();
/// snapshot
///     .add_app_domain(AppDomainDescriptor::new(Address(0x10), "Default"))
///     .add_module(ModuleDescriptor::new(Address(0x4000), "Contoso.dll"), &[Address(0x10)])
///     .add_type(Address(0x4000), TypeDescriptor::new(0x20, "Contoso.Order"));
///
/// let order = DumpTypeKey::new(0x20, "Contoso.Order");
/// snapshot
///     .add_object(ObjectDescriptor::new(Address(0x1000), &order, 24))
///     .add_object(ObjectDescriptor::new(Address(0x1018), &order, 24))
///     .add_reference(Address(0x1000), Address(0x1018));
/// ```
#[derive(Clone, Debug, Default)]
pub struct SyntheticSnapshot {
    info: SnapshotInfo,
    domains: BTreeMap<Address, AppDomainDescriptor>,
    modules: Vec<(ModuleDescriptor, Vec<Address>)>,
    types: HashMap<Address, Vec<TypeDescriptor>>,
    objects: Vec<ObjectDescriptor>,
    references: HashMap<Address, Vec<Address>>,
    threads: Vec<ThreadDescriptor>,
    frames: HashMap<u32, Vec<DumpStackFrame>>,
    stack_roots: HashMap<u32, Vec<RootDescriptor>>,
    global_roots: Vec<RootDescriptor>,
    strings: HashMap<Address, String>,
    timing_text: Option<String>,
    failing_modules: bool,
    failing_objects: bool,
    failing_types: HashSet<Address>,
    failing_references: HashSet<Address>,
    failing_stack_roots: HashSet<u32>,
}

impl SyntheticSnapshot {
    /// Create an empty snapshot of a fully captured 64-bit process
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot-level facts
    pub fn set_info(&mut self, info: SnapshotInfo) -> &mut Self {
        self.info = info;
        self
    }

    /// Add an application domain
    pub fn add_app_domain(&mut self, domain: AppDomainDescriptor) -> &mut Self {
        self.domains.insert(domain.address, domain);
        self
    }

    /// Add a module loaded into the given domains
    ///
    /// Domains not added beforehand are reported without name.
    pub fn add_module(&mut self, module: ModuleDescriptor, domains: &[Address]) -> &mut Self {
        self.modules.push((module, domains.to_vec()));
        self
    }

    /// Add a type to the module stored under `module`
    pub fn add_type(&mut self, module: Address, ty: TypeDescriptor) -> &mut Self {
        self.types.entry(module).or_default().push(ty);
        self
    }

    /// Add a heap slot
    pub fn add_object(&mut self, object: ObjectDescriptor) -> &mut Self {
        self.objects.push(object);
        self
    }

    /// Add a reference from `from` to `to`; `to` need not exist
    pub fn add_reference(&mut self, from: Address, to: Address) -> &mut Self {
        self.references.entry(from).or_default().push(to);
        self
    }

    /// Add a thread
    pub fn add_thread(&mut self, thread: ThreadDescriptor) -> &mut Self {
        self.threads.push(thread);
        self
    }

    /// Append a frame to the stack of the thread `os_id`
    pub fn add_frame(&mut self, os_id: u32, frame: DumpStackFrame) -> &mut Self {
        self.frames.entry(os_id).or_default().push(frame);
        self
    }

    /// Add a root on the stack of `os_id`, visible to the global root walk as well
    pub fn add_stack_root(&mut self, os_id: u32, root: RootDescriptor) -> &mut Self {
        self.global_roots.push(root.clone());
        self.stack_roots.entry(os_id).or_default().push(root);
        self
    }

    /// Add a root that only the stack walk of `os_id` reports
    ///
    /// Models a stack that changed between the global root walk and the thread
    /// walk: the thread claims a root the global walk never saw.
    pub fn add_stale_stack_root(&mut self, os_id: u32, root: RootDescriptor) -> &mut Self {
        self.stack_roots.entry(os_id).or_default().push(root);
        self
    }

    /// Add a root that is not on any stack (handles, statics)
    pub fn add_handle_root(&mut self, root: RootDescriptor) -> &mut Self {
        self.global_roots.push(root);
        self
    }

    /// Set the value returned by [`RuntimeInspector::read_string`] for `address`
    pub fn add_string(&mut self, address: Address, value: impl Into<String>) -> &mut Self {
        self.strings.insert(address, value.into());
        self
    }

    /// Set the thread timing text
    pub fn set_thread_timing_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.timing_text = Some(text.into());
        self
    }

    /// Make module enumeration fail
    pub fn fail_modules(&mut self) -> &mut Self {
        self.failing_modules = true;
        self
    }

    /// Make object enumeration fail
    pub fn fail_objects(&mut self) -> &mut Self {
        self.failing_objects = true;
        self
    }

    /// Make type enumeration of the module stored under `module` fail
    pub fn fail_types_of(&mut self, module: Address) -> &mut Self {
        self.failing_types.insert(module);
        self
    }

    /// Make reference enumeration of the object at `object` fail
    pub fn fail_references_of(&mut self, object: Address) -> &mut Self {
        self.failing_references.insert(object);
        self
    }

    /// Make the stack root walk of thread `os_id` fail
    pub fn fail_stack_roots_of(&mut self, os_id: u32) -> &mut Self {
        self.failing_stack_roots.insert(os_id);
        self
    }

    /// Number of heap slots added, including free blocks
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn domain(&self, address: Address) -> AppDomainDescriptor {
        self.domains
            .get(&address)
            .cloned()
            .unwrap_or(AppDomainDescriptor {
                address,
                name: None,
                config_file: None,
                application_base: None,
            })
    }
}

impl RuntimeInspector for SyntheticSnapshot {
    fn snapshot_info(&self) -> Result<SnapshotInfo> {
        Ok(self.info.clone())
    }

    fn enumerate_modules(&self) -> Result<Vec<ModuleDescriptor>> {
        if self.failing_modules {
            return Err(Error::Inspector("module list is unreadable".to_string()));
        }

        Ok(self
            .modules
            .iter()
            .map(|(module, domains)| {
                let mut module = module.clone();
                module.app_domains = domains.iter().map(|d| self.domain(*d)).collect();
                module
            })
            .collect())
    }

    fn enumerate_types(&self, module: &ModuleDescriptor) -> Result<Vec<TypeDescriptor>> {
        let key = module.key();
        if self.failing_types.contains(&key) {
            return Err(Error::Inspector(format!(
                "type table of module {} is unreadable",
                module.name
            )));
        }

        Ok(self.types.get(&key).cloned().unwrap_or_default())
    }

    fn enumerate_objects(&self) -> Result<Box<dyn Iterator<Item = ObjectDescriptor> + '_>> {
        if self.failing_objects {
            return Err(Error::Inspector("heap segments are unreadable".to_string()));
        }

        Ok(Box::new(self.objects.iter().cloned()))
    }

    fn enumerate_references(&self, object: Address) -> Result<Vec<Address>> {
        if self.failing_references.contains(&object) {
            return Err(Error::Inspector(format!(
                "fields of object {object} are unreadable"
            )));
        }

        Ok(self.references.get(&object).cloned().unwrap_or_default())
    }

    fn enumerate_threads(&self) -> Result<Vec<ThreadDescriptor>> {
        Ok(self.threads.clone())
    }

    fn enumerate_stack_frames(&self, thread: &ThreadDescriptor) -> Result<Vec<DumpStackFrame>> {
        Ok(self.frames.get(&thread.os_id).cloned().unwrap_or_default())
    }

    fn enumerate_stack_roots(&self, thread: &ThreadDescriptor) -> Result<Vec<RootDescriptor>> {
        if self.failing_stack_roots.contains(&thread.os_id) {
            return Err(Error::Inspector(format!(
                "stack of thread 0x{:x} is unwalkable",
                thread.os_id
            )));
        }

        Ok(self
            .stack_roots
            .get(&thread.os_id)
            .cloned()
            .unwrap_or_default())
    }

    fn enumerate_roots(&self, _policy: RootWalkPolicy) -> Result<Vec<RootDescriptor>> {
        Ok(self.global_roots.clone())
    }

    fn read_string(&self, address: Address) -> Result<String> {
        self.strings
            .get(&address)
            .cloned()
            .ok_or(Error::ObjectNotFound(address))
    }

    fn thread_timing_text(&self) -> Option<String> {
        self.timing_text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DumpTypeKey;

    #[test]
    fn test_modules_carry_domains() {
        let mut snapshot = SyntheticSnapshot::new();
        snapshot
            .add_app_domain(AppDomainDescriptor::new(Address(0x10), "Default"))
            .add_module(
                ModuleDescriptor::new(Address(0x4000), "Contoso.dll"),
                &[Address(0x10), Address(0x20)],
            );

        let modules = snapshot.enumerate_modules().unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].app_domains.len(), 2);
        assert_eq!(modules[0].app_domains[0].name.as_deref(), Some("Default"));
        assert_eq!(modules[0].app_domains[1].name, None);
    }

    #[test]
    fn test_stale_roots_are_invisible_to_global_walk() {
        let mut snapshot = SyntheticSnapshot::new();
        snapshot
            .add_thread(ThreadDescriptor::new(1, 1))
            .add_stack_root(1, RootDescriptor::local(Address(0x50), Address(0x100)))
            .add_stale_stack_root(1, RootDescriptor::local(Address(0x58), Address(0x108)));

        let global = snapshot.enumerate_roots(RootWalkPolicy::Automatic).unwrap();
        assert_eq!(global.len(), 1);

        let stack = snapshot
            .enumerate_stack_roots(&ThreadDescriptor::new(1, 1))
            .unwrap();
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_failures() {
        let key = DumpTypeKey::new(0x20, "A");
        let mut snapshot = SyntheticSnapshot::new();
        snapshot
            .add_object(ObjectDescriptor::new(Address(0x100), &key, 24))
            .fail_references_of(Address(0x100))
            .fail_objects();

        assert!(matches!(
            snapshot.enumerate_references(Address(0x100)),
            Err(Error::Inspector(_))
        ));
        assert!(snapshot.enumerate_objects().is_err());
        assert!(matches!(
            snapshot.read_string(Address(0x100)),
            Err(Error::ObjectNotFound(_))
        ));
    }
}
