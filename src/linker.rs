//! Graph linking pass.
//!
//! The object pass records outbound references in an adjacency map instead of
//! attaching them to objects, so that no edge can point at an object that does
//! not exist yet. Once the object store is complete, [`GraphLinker`] converts the
//! map into bidirectional edges: the child is added to the parent's references,
//! the parent to the child's referencers. Edges whose child is not in the store
//! are dropped and reported once each.
//!
//! Linking is order independent. Each object's edge sets are lock-free skip
//! sets, so the map can be consumed on the rayon pool without further
//! synchronization and any interleaving produces the same graph.

use std::{
    collections::HashSet,
    sync::atomic::{AtomicUsize, Ordering},
};

use crossbeam_skiplist::SkipMap;
use rayon::prelude::*;

use crate::{
    builder::context::report,
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    model::{Address, DumpObjectRc},
};

/// Counters of a linking run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Edges established
    pub linked: usize,
    /// Edges dropped because the child was not in the object store
    pub missing: usize,
}

/// Converts an adjacency map into object edges.
pub(crate) struct GraphLinker<'a> {
    objects: &'a SkipMap<Address, DumpObjectRc>,
    diagnostics: &'a Diagnostics,
    parallel: bool,
    linked: AtomicUsize,
    missing: AtomicUsize,
}

impl<'a> GraphLinker<'a> {
    pub fn new(
        objects: &'a SkipMap<Address, DumpObjectRc>,
        diagnostics: &'a Diagnostics,
        parallel: bool,
    ) -> Self {
        GraphLinker {
            objects,
            diagnostics,
            parallel,
            linked: AtomicUsize::new(0),
            missing: AtomicUsize::new(0),
        }
    }

    /// Consumes `adjacency` and links every edge it describes.
    pub fn link<I>(self, adjacency: I) -> LinkStats
    where
        I: IntoParallelIterator<Item = (Address, Vec<Address>)>
            + IntoIterator<Item = (Address, Vec<Address>)>,
    {
        let span = tracing::info_span!("link_pass", parallel = self.parallel);
        let _guard = span.enter();

        if self.parallel {
            adjacency
                .into_par_iter()
                .for_each(|(parent, children)| self.link_parent(parent, &children));
        } else {
            for (parent, children) in adjacency {
                self.link_parent(parent, &children);
            }
        }

        let stats = LinkStats {
            linked: self.linked.load(Ordering::Relaxed),
            missing: self.missing.load(Ordering::Relaxed),
        };
        tracing::info!(
            linked = stats.linked,
            missing = stats.missing,
            "link pass complete"
        );
        stats
    }

    fn link_parent(&self, parent: Address, children: &[Address]) {
        let Some(parent_entry) = self.objects.get(&parent) else {
            // the object pass only records parents it inserted
            tracing::debug!(%parent, "adjacency entry without object");
            return;
        };
        let parent_object = parent_entry.value();
        let mut seen = HashSet::with_capacity(children.len());

        for &child in children {
            if !seen.insert(child) {
                continue;
            }

            let Some(child_entry) = self.objects.get(&child) else {
                self.missing.fetch_add(1, Ordering::Relaxed);
                report(
                    self.diagnostics,
                    Diagnostic::new(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::Reference,
                        format!("referenced object {child} is not in the object store"),
                    )
                    .with_address(parent),
                );
                continue;
            };

            parent_object.add_reference(child);
            child_entry.value().add_referencer(parent);
            self.linked.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DumpObject, DumpTypeKey, Generation, ObjectPayload};
    use std::{collections::HashMap, sync::Arc};

    fn store(addresses: &[u64]) -> SkipMap<Address, DumpObjectRc> {
        let store = SkipMap::new();
        for &address in addresses {
            store.insert(
                Address(address),
                Arc::new(DumpObject::new(
                    Address(address),
                    DumpTypeKey::new(0x10, "Node"),
                    24,
                    Generation::Gen0,
                    ObjectPayload::None,
                    "default",
                )),
            );
        }
        store
    }

    fn adjacency() -> HashMap<Address, Vec<Address>> {
        let mut adjacency = HashMap::new();
        adjacency.insert(Address(0x100), vec![Address(0x200), Address(0x300)]);
        adjacency.insert(Address(0x200), vec![Address(0x300), Address(0x900)]);
        adjacency.insert(Address(0x300), vec![Address(0x100)]);
        adjacency
    }

    fn assert_linked(store: &SkipMap<Address, DumpObjectRc>, stats: LinkStats, diagnostics: &Diagnostics) {
        assert_eq!(stats, LinkStats { linked: 4, missing: 1 });
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.for_address(Address(0x200)).len(), 1);

        for entry in store.iter() {
            let object = entry.value();
            for child in object.references() {
                let child = store.get(&child).unwrap();
                assert!(child.value().is_referenced_by(object.address));
            }
            for parent in object.referencers() {
                let parent = store.get(&parent).unwrap();
                assert!(parent.value().references_address(object.address));
            }
        }

        let target = store.get(&Address(0x300)).unwrap();
        assert_eq!(
            target.value().referencers().collect::<Vec<_>>(),
            vec![Address(0x100), Address(0x200)]
        );
    }

    #[test]
    fn test_sequential_linking() {
        let store = store(&[0x100, 0x200, 0x300]);
        let diagnostics = Diagnostics::new();
        let stats = GraphLinker::new(&store, &diagnostics, false).link(adjacency());
        assert_linked(&store, stats, &diagnostics);
    }

    #[test]
    fn test_parallel_linking() {
        let store = store(&[0x100, 0x200, 0x300]);
        let diagnostics = Diagnostics::new();
        let stats = GraphLinker::new(&store, &diagnostics, true).link(adjacency());
        assert_linked(&store, stats, &diagnostics);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let store = store(&[0x100, 0x200]);
        let diagnostics = Diagnostics::new();
        let mut adjacency = HashMap::new();
        adjacency.insert(Address(0x100), vec![Address(0x200), Address(0x200)]);

        let stats = GraphLinker::new(&store, &diagnostics, false).link(adjacency);
        assert_eq!(stats.linked, 1);
        let parent = store.get(&Address(0x100)).unwrap();
        assert_eq!(parent.value().reference_count(), 1);
    }

    #[test]
    fn test_repeated_missing_child_reported_once() {
        let store = store(&[0x100]);
        let diagnostics = Diagnostics::new();
        let mut adjacency = HashMap::new();
        adjacency.insert(
            Address(0x100),
            vec![Address(0xdead), Address(0xdead), Address(0xdead)],
        );

        let stats = GraphLinker::new(&store, &diagnostics, true).link(adjacency);
        assert_eq!(stats, LinkStats { linked: 0, missing: 1 });
        assert_eq!(diagnostics.for_address(Address(0x100)).len(), 1);
    }
}
