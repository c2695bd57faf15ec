//! Thread lookups.

use crossbeam_skiplist::SkipMap;

use crate::{model::DumpThreadRc, Error, Result};

/// Read access to the OS threads of a snapshot, keyed by OS thread id.
pub struct DumpThreadRepository {
    threads: SkipMap<u32, DumpThreadRc>,
}

impl DumpThreadRepository {
    pub(crate) fn new(threads: SkipMap<u32, DumpThreadRc>) -> Self {
        DumpThreadRepository { threads }
    }

    /// Look up a thread by OS id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadNotFound`] if no thread with `os_id` was captured.
    pub fn get(&self, os_id: u32) -> Result<DumpThreadRc> {
        self.threads
            .get(&os_id)
            .map(|entry| entry.value().clone())
            .ok_or(Error::ThreadNotFound(os_id))
    }

    /// Look up a thread by managed thread id
    pub fn by_managed_id(&self, managed_thread_id: u32) -> Option<DumpThreadRc> {
        self.threads()
            .find(|thread| thread.managed_thread_id == managed_thread_id)
    }

    /// The finalizer thread, if one was captured
    pub fn finalizer(&self) -> Option<DumpThreadRc> {
        self.threads().find(|thread| thread.is_finalizer)
    }

    /// Iterate all threads in OS id order.
    pub fn threads(&self) -> impl Iterator<Item = DumpThreadRc> + '_ {
        self.threads.iter().map(|entry| entry.value().clone())
    }

    /// Threads sorted by total CPU time, busiest first.
    ///
    /// Threads without timing information sort last.
    pub fn by_cpu_time(&self) -> Vec<DumpThreadRc> {
        let mut threads: Vec<_> = self.threads().collect();
        threads.sort_by(|a, b| b.total_cpu_time().cmp(&a.total_cpu_time()));
        threads
    }

    /// Number of threads
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Returns true if no threads were captured
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DumpThread;
    use std::{sync::Arc, time::Duration};

    fn repository() -> DumpThreadRepository {
        let threads = SkipMap::new();
        threads.insert(
            0x2a10,
            Arc::new(DumpThread {
                os_id: 0x2a10,
                managed_thread_id: 2,
                is_finalizer: true,
                user_mode_time: Some(Duration::from_secs(3)),
                ..Default::default()
            }),
        );
        threads.insert(
            0x1c8c,
            Arc::new(DumpThread {
                os_id: 0x1c8c,
                managed_thread_id: 1,
                user_mode_time: Some(Duration::from_secs(1)),
                kernel_mode_time: Some(Duration::from_secs(1)),
                ..Default::default()
            }),
        );
        threads.insert(
            0x3000,
            Arc::new(DumpThread {
                os_id: 0x3000,
                managed_thread_id: 7,
                ..Default::default()
            }),
        );
        DumpThreadRepository::new(threads)
    }

    #[test]
    fn test_thread_lookup() {
        let repository = repository();
        assert_eq!(repository.len(), 3);
        assert_eq!(repository.get(0x1c8c).unwrap().managed_thread_id, 1);
        assert_eq!(repository.by_managed_id(2).unwrap().os_id, 0x2a10);
        assert_eq!(repository.finalizer().unwrap().os_id, 0x2a10);
        assert!(matches!(
            repository.get(0xdead),
            Err(Error::ThreadNotFound(0xdead))
        ));
    }

    #[test]
    fn test_busiest_thread_first() {
        let order: Vec<u32> = repository().by_cpu_time().iter().map(|t| t.os_id).collect();
        assert_eq!(order, vec![0x2a10, 0x1c8c, 0x3000]);
    }
}
