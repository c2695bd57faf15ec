//! Threads and their call stacks.

use std::time::Duration;

use crate::model::Address;

/// Kind of a stack frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// A managed method frame
    Managed,
    /// A runtime-internal frame (transition, helper, ...)
    Runtime,
}

/// One frame of a thread's call stack, as displayed by the runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DumpStackFrame {
    /// Display string of the frame
    pub display_string: String,
    /// Frame kind
    pub kind: FrameKind,
    /// Instruction pointer
    pub instruction_pointer: Address,
    /// Stack pointer
    pub stack_pointer: Address,
    /// Name of the module containing the method
    pub module_name: Option<String>,
}

/// An OS thread that ran managed code.
///
/// Threads are assembled and enriched (roots, timings) privately by the thread
/// pass and frozen once handed to the repository.
#[derive(Clone, Debug, Default)]
pub struct DumpThread {
    /// OS thread id; store key
    pub os_id: u32,
    /// Managed thread id
    pub managed_thread_id: u32,
    /// Address of the runtime thread object
    pub address: Address,
    /// Domain the thread is currently running in
    pub app_domain: Option<Address>,
    /// Debugger-assigned thread index
    pub debugger_index: Option<u32>,
    /// Call-stack frames, innermost first
    pub stack_frames: Vec<DumpStackFrame>,
    /// Addresses of the GC roots held by this thread
    pub roots: Vec<Address>,
    /// Accumulated user-mode CPU time
    pub user_mode_time: Option<Duration>,
    /// Accumulated kernel-mode CPU time
    pub kernel_mode_time: Option<Duration>,
    /// Elapsed time since thread creation
    pub elapsed_time: Option<Duration>,
    /// Thread is the finalizer thread
    pub is_finalizer: bool,
    /// Thread is a background thread
    pub is_background: bool,
}

impl DumpThread {
    /// Managed frames only
    pub fn managed_frames(&self) -> impl Iterator<Item = &DumpStackFrame> + '_ {
        self.stack_frames
            .iter()
            .filter(|frame| frame.kind == FrameKind::Managed)
    }

    /// Total CPU time, if any timing was collected
    pub fn total_cpu_time(&self) -> Option<Duration> {
        match (self.user_mode_time, self.kernel_mode_time) {
            (None, None) => None,
            (user, kernel) => Some(user.unwrap_or_default() + kernel.unwrap_or_default()),
        }
    }

    /// The stack rendered one frame per line, innermost first
    pub fn stack_text(&self) -> String {
        self.stack_frames
            .iter()
            .map(|frame| frame.display_string.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str, kind: FrameKind) -> DumpStackFrame {
        DumpStackFrame {
            display_string: text.to_string(),
            kind,
            instruction_pointer: Address(0x1),
            stack_pointer: Address(0x2),
            module_name: None,
        }
    }

    #[test]
    fn test_managed_frames_and_text() {
        let thread = DumpThread {
            os_id: 0x1c8c,
            stack_frames: vec![
                frame("[HelperMethodFrame]", FrameKind::Runtime),
                frame("Contoso.Program.Main()", FrameKind::Managed),
            ],
            ..Default::default()
        };
        assert_eq!(thread.managed_frames().count(), 1);
        assert_eq!(
            thread.stack_text(),
            "[HelperMethodFrame]\nContoso.Program.Main()"
        );
    }

    #[test]
    fn test_total_cpu_time() {
        let mut thread = DumpThread::default();
        assert_eq!(thread.total_cpu_time(), None);

        thread.user_mode_time = Some(Duration::from_millis(1500));
        assert_eq!(thread.total_cpu_time(), Some(Duration::from_millis(1500)));

        thread.kernel_mode_time = Some(Duration::from_millis(500));
        assert_eq!(thread.total_cpu_time(), Some(Duration::from_secs(2)));
    }
}
