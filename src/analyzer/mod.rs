//! Read-only helpers for analyzers running over finished repositories.
//!
//! Nothing here touches the inspector; every helper works on the repositories
//! alone and can run concurrently with other readers.
//!
//! - [`frame_rollup`] / [`unique_stacks`] - What the threads were doing
//! - [`retention_path`] - Why an object was still alive

mod retention;
mod stacks;

pub use retention::{retention_path, RetentionPath};
pub use stacks::{frame_rollup, unique_stacks, FrameRollup, UniqueStack};
