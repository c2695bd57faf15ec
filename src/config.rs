//! Construction configuration
//!
//! Settings are resolved once, before construction starts, and passed to
//! [`crate::builder::RepositoryFactory`] as a plain value. Nothing reads settings
//! from the environment during construction.

use std::fmt;

/// How GC roots on thread stacks are walked.
///
/// Mirrors the walk modes offered by runtime inspectors. The graph builder only
/// consumes the result, so the policy decides which stack roots are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RootWalkPolicy {
    /// Let the inspector choose; all reported roots are kept
    #[default]
    Automatic,
    /// Keep only roots that are known to be live; conservative hits are dropped
    Exact,
    /// Conservative walk; all reported roots are kept
    Fast,
    /// Do not walk thread stacks at all
    SkipStack,
}

impl RootWalkPolicy {
    /// Returns true if stack roots should be enumerated at all
    pub fn walks_stacks(self) -> bool {
        self != RootWalkPolicy::SkipStack
    }

    /// Returns true if roots flagged as possible false positives are kept
    pub fn keeps_possible_false_positives(self) -> bool {
        self != RootWalkPolicy::Exact
    }
}

impl fmt::Display for RootWalkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootWalkPolicy::Automatic => write!(f, "automatic"),
            RootWalkPolicy::Exact => write!(f, "exact"),
            RootWalkPolicy::Fast => write!(f, "fast"),
            RootWalkPolicy::SkipStack => write!(f, "skip-stack"),
        }
    }
}

/// Configuration for a single graph construction run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct BuildConfig {
    /// Run the linking pass on the rayon thread pool
    pub parallel_linking: bool,

    /// Consume the inspector's thread timing text and fill in CPU times
    pub collect_thread_times: bool,

    /// Record display stack frames for every thread
    pub capture_stack_frames: bool,

    /// Abort on structural defects (duplicate addresses, unknown object types)
    /// When false they are logged and the offending object is skipped
    pub strict: bool,

    /// Which stack roots to keep
    pub root_policy: RootWalkPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            parallel_linking: true,
            collect_thread_times: true,
            capture_stack_frames: true,
            strict: true,
            root_policy: RootWalkPolicy::Automatic,
        }
    }
}

impl BuildConfig {
    /// Creates a configuration that links on the calling thread
    ///
    /// Produces the same graph as the default; useful when the caller already
    /// owns the rayon pool or needs deterministic diagnostic order.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel_linking: false,
            ..Self::default()
        }
    }

    /// Creates a configuration for damaged or inconsistent snapshots
    ///
    /// Structural defects are downgraded to per-object errors.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    /// Creates a configuration that builds only the object graph
    ///
    /// Skips stack frames, stack roots and thread timings.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            parallel_linking: true,
            collect_thread_times: false,
            capture_stack_frames: false,
            strict: true,
            root_policy: RootWalkPolicy::SkipStack,
        }
    }

    /// Sets the root walk policy
    #[must_use]
    pub fn with_root_policy(mut self, policy: RootWalkPolicy) -> Self {
        self.root_policy = policy;
        self
    }
}
