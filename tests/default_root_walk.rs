//! Construction against an inspector that derives its global roots from the
//! default stack walk.

use std::cell::Cell;

use dumpgraph::prelude::*;

const MODULE: Address = Address(0x7ff8_1000_0000);

/// Forwards every accessor except `enumerate_roots`, counting stack walks.
struct StackWalkingInspector<'a> {
    inner: &'a SyntheticSnapshot,
    stack_walks: Cell<usize>,
}

impl<'a> StackWalkingInspector<'a> {
    fn new(inner: &'a SyntheticSnapshot) -> Self {
        StackWalkingInspector {
            inner,
            stack_walks: Cell::new(0),
        }
    }
}

impl RuntimeInspector for StackWalkingInspector<'_> {
    fn snapshot_info(&self) -> Result<SnapshotInfo> {
        self.inner.snapshot_info()
    }

    fn enumerate_modules(&self) -> Result<Vec<ModuleDescriptor>> {
        self.inner.enumerate_modules()
    }

    fn enumerate_types(&self, module: &ModuleDescriptor) -> Result<Vec<TypeDescriptor>> {
        self.inner.enumerate_types(module)
    }

    fn enumerate_objects(&self) -> Result<Box<dyn Iterator<Item = ObjectDescriptor> + '_>> {
        self.inner.enumerate_objects()
    }

    fn enumerate_references(&self, object: Address) -> Result<Vec<Address>> {
        self.inner.enumerate_references(object)
    }

    fn enumerate_threads(&self) -> Result<Vec<ThreadDescriptor>> {
        self.inner.enumerate_threads()
    }

    fn enumerate_stack_roots(&self, thread: &ThreadDescriptor) -> Result<Vec<RootDescriptor>> {
        self.stack_walks.set(self.stack_walks.get() + 1);
        self.inner.enumerate_stack_roots(thread)
    }
}

fn slot(os_id: u32) -> Address {
    Address(0x00ff_0000 + u64::from(os_id) * 0x100)
}

fn object(index: u64) -> Address {
    Address(0x1000 + index * 0x20)
}

/// Three threads, each rooting one object from its stack.
fn snapshot() -> SyntheticSnapshot {
    let node = DumpTypeKey::new(0x100, "Contoso.Node");
    let mut snapshot = SyntheticSnapshot::new();
    snapshot
        .add_module(ModuleDescriptor::new(MODULE, "Contoso.dll"), &[])
        .add_type(MODULE, TypeDescriptor::new(0x100, "Contoso.Node"));
    for os_id in 1..=3u32 {
        let target = object(u64::from(os_id));
        snapshot
            .add_object(ObjectDescriptor::new(target, &node, 32))
            .add_thread(ThreadDescriptor::new(os_id, os_id))
            .add_stack_root(os_id, RootDescriptor::local(slot(os_id), target));
    }
    snapshot
}

#[test]
fn test_default_walk_collects_every_stack() {
    let snapshot = snapshot();
    let inspector = StackWalkingInspector::new(&snapshot);
    let repos = RepositoryFactory::new(&inspector).build().unwrap();

    assert_eq!(repos.objects().root_count(), 3);
    for os_id in 1..=3u32 {
        assert_eq!(repos.get_thread(os_id).unwrap().roots, vec![slot(os_id)]);
    }
}

#[test]
fn test_unwalkable_stack_only_loses_its_own_roots() {
    let mut snapshot = snapshot();
    snapshot.fail_stack_roots_of(2);
    let inspector = StackWalkingInspector::new(&snapshot);
    let repos = RepositoryFactory::new(&inspector).build().unwrap();

    assert_eq!(repos.objects().root_count(), 2);
    assert!(repos.objects().get_root(slot(1)).is_ok());
    assert!(repos.objects().get_root(slot(2)).is_err());
    assert!(repos.objects().get_root(slot(3)).is_ok());

    let broken = repos.get_thread(2).unwrap();
    assert!(broken.roots.is_empty());
    assert_eq!(repos.get_thread(3).unwrap().roots, vec![slot(3)]);

    let warnings = repos.diagnostics().by_category(DiagnosticCategory::Thread);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].os_thread_id, Some(2));
}

#[test]
fn test_skip_stack_never_walks() {
    let snapshot = snapshot();
    let inspector = StackWalkingInspector::new(&snapshot);
    let repos = RepositoryFactory::new(&inspector)
        .with_config(BuildConfig::default().with_root_policy(RootWalkPolicy::SkipStack))
        .build()
        .unwrap();

    assert_eq!(inspector.stack_walks.get(), 0);
    assert_eq!(repos.objects().root_count(), 0);
    assert_eq!(repos.threads().len(), 3);
}
