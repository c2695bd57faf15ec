//! Stack frame rollups across all threads.

use std::collections::HashMap;

use crate::repository::DumpThreadRepository;

/// How often one managed frame occurs across all thread stacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRollup {
    /// Display string of the frame
    pub display_string: String,
    /// Module of the first occurrence of the frame
    pub module_name: Option<String>,
    /// Number of occurrences over all stacks
    pub count: usize,
}

/// A managed stack shared by one or more threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueStack {
    /// The managed frames, one per line, innermost first
    pub stack_text: String,
    /// OS ids of the threads showing exactly this stack, ascending
    pub threads: Vec<u32>,
}

impl UniqueStack {
    /// Number of threads with this stack
    pub fn count(&self) -> usize {
        self.threads.len()
    }
}

/// Counts every managed frame over all threads, most frequent first.
///
/// Frames with equal counts are ordered by display string.
pub fn frame_rollup(threads: &DumpThreadRepository) -> Vec<FrameRollup> {
    let mut rollup: HashMap<String, FrameRollup> = HashMap::new();

    for thread in threads.threads() {
        for frame in thread.managed_frames() {
            rollup
                .entry(frame.display_string.clone())
                .or_insert_with(|| FrameRollup {
                    display_string: frame.display_string.clone(),
                    module_name: frame.module_name.clone(),
                    count: 0,
                })
                .count += 1;
        }
    }

    let mut rollup: Vec<_> = rollup.into_values().collect();
    rollup.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.display_string.cmp(&b.display_string))
    });
    rollup
}

/// Groups threads by identical managed stack, most common stack first.
///
/// Threads without managed frames are left out. Among stacks shared by the
/// same number of threads, deeper (longer) stacks come first.
pub fn unique_stacks(threads: &DumpThreadRepository) -> Vec<UniqueStack> {
    let mut stacks: HashMap<String, Vec<u32>> = HashMap::new();

    for thread in threads.threads() {
        let text = thread
            .managed_frames()
            .map(|frame| frame.display_string.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            continue;
        }
        stacks.entry(text).or_default().push(thread.os_id);
    }

    let mut stacks: Vec<_> = stacks
        .into_iter()
        .map(|(stack_text, threads)| UniqueStack {
            stack_text,
            threads,
        })
        .collect();
    stacks.sort_by(|a, b| {
        b.count()
            .cmp(&a.count())
            .then_with(|| b.stack_text.len().cmp(&a.stack_text.len()))
            .then_with(|| a.stack_text.cmp(&b.stack_text))
    });
    stacks
}
