// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # dumpgraph
//!
//! Builds an in-memory object graph from a memory snapshot of a managed-runtime
//! process and hands it out as read-only, address-indexed repositories.
//!
//! A snapshot is read through a [`inspector::RuntimeInspector`], the single seam
//! to whatever debugging backend opened the dump. Construction walks the
//! inspector once: modules, app domains and types first, then every live heap
//! object, the GC roots, the reference edges between objects and finally the OS
//! threads with their stacks and CPU times. The result is a [`repository::DumpRepositories`]
//! value that analyzers query concurrently without locking.
//!
//! ## Features
//!
//! - **Address-indexed stores** - Objects, roots, modules and domains keyed by address,
//!   types by method table and name, threads by OS id
//! - **Bidirectional edges** - Every object knows what it references and what references it
//! - **Pluggable extraction** - Type-specific extractors with a guaranteed generic fallback
//! - **Tolerant construction** - Broken objects, edges and roots are logged and skipped,
//!   only unusable snapshots abort
//! - **Parallel linking** - Edge construction runs on the rayon pool
//!
//! ## Quick Start
//!
//! ```rust
//! use dumpgraph::prelude::*;
//!
//! let node = DumpTypeKey::new(0x200, "Contoso.Node");
//! let mut snapshot = SyntheticSnapshot::new();
//! snapshot
//!     .add_module(ModuleDescriptor::new(Address(0x4000), "Contoso.dll"), &[])
//!     .add_type(Address(0x4000), TypeDescriptor::new(0x200, "Contoso.Node"))
//!     .add_object(ObjectDescriptor::new(Address(0x1000), &node, 32))
//!     .add_object(ObjectDescriptor::new(Address(0x2000), &node, 32))
//!     .add_reference(Address(0x1000), Address(0x2000));
//!
//! let repos = RepositoryFactory::new(&snapshot).build()?;
//!
//! let child = repos.get_object(Address(0x2000))?;
//! assert!(child.is_referenced_by(Address(0x1000)));
//! assert_eq!(repos.types().by_name("Contoso.Node")[0].object_count(), 2);
//! # Ok::<(), dumpgraph::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`inspector`] - The inspector trait, its descriptors and an in-memory snapshot
//! - [`extraction`] - Extraction strategies and their registry
//! - [`builder`] - The construction passes and [`builder::RepositoryFactory`]
//! - [`linker`] - Turns recorded references into bidirectional edges
//! - [`repository`] - Read-only access to the finished graph
//! - [`analyzer`] - Stack rollups and retention paths over the repositories
//! - [`model`] - The entity definitions
//! - [`diagnostics`] - Everything that was skipped, and why
//! - [`config`] - Construction settings
//!
//! ## Error Handling
//!
//! Operations that can abort return [`Result<T>`]. Per-entity problems never
//! surface as errors; they are collected in [`diagnostics::Diagnostics`] and
//! mirrored as `tracing` events. Enable the `logging` feature for a ready-made
//! subscriber.

pub mod analyzer;
pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod extraction;
pub mod inspector;
pub mod linker;
#[cfg(feature = "logging")]
pub mod logging;
pub mod model;
pub mod prelude;
pub mod repository;

mod error;

/// `dumpgraph` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dumpgraph` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;
