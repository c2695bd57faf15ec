//! Diagnostics collection for graph construction.
//!
//! Construction tolerates partial and inconsistent snapshot data: a single
//! object whose extractor fails, an edge pointing outside the heap or a root the
//! global pass never saw must not abort the whole build. Each such problem is
//! recorded here exactly once, with enough context (category, address, OS thread
//! id) to locate the affected entity afterwards.
//!
//! The [`Diagnostics`] container uses `boxcar::Vec` for thread-safe, lock-free
//! append operations, so the parallel linking pass can report missing edges
//! without synchronization.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - Thread-safe container for diagnostic entries
//! - [`Diagnostic`] - Individual diagnostic entry with severity and context
//! - [`DiagnosticSeverity`] - Severity level (Info, Warning, Error)
//! - [`DiagnosticCategory`] - Construction pass or entity kind that reported it
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use dumpgraph::diagnostics::{DiagnosticCategory, Diagnostics};
//!
//! # fn inspect(diagnostics: &Diagnostics) {
//! for entry in diagnostics.by_category(DiagnosticCategory::Reference) {
//!     println!("{entry}");
//! }
//!
//! if diagnostics.has_errors() {
//!     println!("{}", diagnostics.summary());
//! }
//! # }
//! ```

use std::fmt::{self, Write};

use strum::{EnumCount, EnumIter};

use crate::model::Address;

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    ///
    /// Used for noting unusual but valid snapshot properties.
    Info,

    /// Something was omitted or left unresolved.
    ///
    /// The graph is still consistent, but an edge, root or link is absent.
    Warning,

    /// An entity could not be built and was excluded from the graph.
    ///
    /// In strict mode some of these abort construction instead.
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category indicating which pass or entity kind produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum DiagnosticCategory {
    /// Module enumeration or module details.
    Module,

    /// Application domain linking.
    AppDomain,

    /// Type enumeration and base-type resolution.
    ///
    /// Examples: per-module type enumeration failures, unresolved base types.
    Type,

    /// Object enumeration and type attachment.
    ///
    /// Examples: unnamed types, unknown type keys, duplicate addresses in lenient mode.
    Object,

    /// Type-specific extractor failures that fell back to generic extraction.
    Extraction,

    /// Reference enumeration and linking.
    ///
    /// Examples: edge targets that are not in the object store.
    Reference,

    /// GC root extraction and joining.
    Root,

    /// Thread enumeration and stack walks.
    Thread,

    /// The CPU-time text stream.
    ThreadTiming,

    /// Snapshot-level observations not fitting other categories.
    General,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Module => write!(f, "Module"),
            DiagnosticCategory::AppDomain => write!(f, "AppDomain"),
            DiagnosticCategory::Type => write!(f, "Type"),
            DiagnosticCategory::Object => write!(f, "Object"),
            DiagnosticCategory::Extraction => write!(f, "Extraction"),
            DiagnosticCategory::Reference => write!(f, "Reference"),
            DiagnosticCategory::Root => write!(f, "Root"),
            DiagnosticCategory::Thread => write!(f, "Thread"),
            DiagnosticCategory::ThreadTiming => write!(f, "ThreadTiming"),
            DiagnosticCategory::General => write!(f, "General"),
        }
    }
}

/// A single diagnostic entry with locating context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// Address of the affected object, root, module or domain.
    pub address: Option<Address>,

    /// OS id of the affected thread.
    pub os_thread_id: Option<u32>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    ///
    /// # Arguments
    ///
    /// * `severity` - Severity level of the diagnostic
    /// * `category` - Category of the diagnostic source
    /// * `message` - Human-readable description
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            address: None,
            os_thread_id: None,
        }
    }

    /// Adds the address of the affected entity.
    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Adds the OS id of the affected thread.
    #[must_use]
    pub fn with_thread(mut self, os_id: u32) -> Self {
        self.os_thread_id = Some(os_id);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(address) = self.address {
            write!(f, " (address: {address})")?;
        }

        if let Some(os_id) = self.os_thread_id {
            write!(f, " (thread: 0x{os_id:x})")?;
        }

        Ok(())
    }
}

/// Thread-safe container for collecting diagnostic entries.
///
/// Uses `boxcar::Vec` internally for lock-free concurrent append operations.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds a diagnostic entry.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any error-level diagnostics have been collected.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns true if any warning-level diagnostics have been collected.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of diagnostics with the given severity.
    pub fn count_severity(&self, severity: DiagnosticSeverity) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == severity)
            .count()
    }

    /// Returns the number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.count_severity(DiagnosticSeverity::Error)
    }

    /// Returns the number of warning-level diagnostics.
    pub fn warning_count(&self) -> usize {
        self.count_severity(DiagnosticSeverity::Warning)
    }

    /// Returns an iterator over all diagnostics, in report order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns all errors as a vector.
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .collect()
    }

    /// Returns all warnings as a vector.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .collect()
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Returns all diagnostics attached to the given address.
    pub fn for_address(&self, address: Address) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.address == Some(address)).collect()
    }

    /// Formats a summary of all diagnostics for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let error_count = self.error_count();
        let warning_count = self.warning_count();
        let info_count = self.count_severity(DiagnosticSeverity::Info);

        let _ = writeln!(
            output,
            "Diagnostics: {} error(s), {} warning(s), {} info(s)",
            error_count, warning_count, info_count
        );

        if error_count > 0 {
            output.push_str("\nErrors:\n");
            for diag in self.errors() {
                let _ = writeln!(output, "  {diag}");
            }
        }

        if warning_count > 0 {
            output.push_str("\nWarnings:\n");
            for diag in self.warnings() {
                let _ = writeln!(output, "  {diag}");
            }
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
