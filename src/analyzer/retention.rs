//! Retention paths: which chain of references keeps an object alive.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{
    model::{Address, DumpObjectRootRc},
    repository::DumpObjectRepository,
    Result,
};

/// A chain of references from a GC-rooted object down to a target object.
#[derive(Debug, Clone)]
pub struct RetentionPath {
    /// Object addresses, starting at the rooted object and ending at the target
    pub objects: Vec<Address>,
    /// Roots pointing at the first object of the path
    pub roots: Vec<DumpObjectRootRc>,
}

impl RetentionPath {
    /// The rooted object at the start of the path
    pub fn rooted_object(&self) -> Option<Address> {
        self.objects.first().copied()
    }

    /// Number of references between the rooted object and the target
    pub fn depth(&self) -> usize {
        self.objects.len().saturating_sub(1)
    }
}

/// Finds the shortest chain of referencers from `target` to a rooted object.
///
/// The search walks referencer edges breadth-first, so the returned path has the
/// fewest hops; among equally short paths the one through lower addresses wins.
/// `max_depth` bounds the number of hops explored. Returns `Ok(None)` if the
/// object is unreachable from any root within that bound.
///
/// # Errors
///
/// Returns [`crate::Error::ObjectNotFound`] if `target` is not in the object store.
pub fn retention_path(
    objects: &DumpObjectRepository,
    target: Address,
    max_depth: Option<usize>,
) -> Result<Option<RetentionPath>> {
    objects.get(target)?;

    // child -> the referencer it was reached from, towards the target
    let mut reached_from: HashMap<Address, Address> = HashMap::new();
    let mut visited = HashSet::from([target]);
    let mut queue = VecDeque::from([(target, 0usize)]);

    while let Some((current, depth)) = queue.pop_front() {
        if objects.is_rooted(current) {
            let mut path = vec![current];
            let mut cursor = current;
            while let Some(&next) = reached_from.get(&cursor) {
                path.push(next);
                cursor = next;
            }
            return Ok(Some(RetentionPath {
                roots: objects.roots_of(current),
                objects: path,
            }));
        }

        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }

        let Ok(object) = objects.get(current) else {
            continue;
        };
        for parent in object.referencers() {
            if visited.insert(parent) {
                reached_from.insert(parent, current);
                queue.push_back((parent, depth + 1));
            }
        }
    }

    Ok(None)
}
