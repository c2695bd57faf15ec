//! State shared by the construction passes.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;

use crate::{
    builder::BuildStats,
    config::BuildConfig,
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    inspector::RuntimeInspector,
    model::{
        Address, DumpAppDomainRc, DumpModuleRc, DumpObjectRc, DumpObjectRootRc, DumpThreadRc,
        DumpTypeKey, DumpTypeRc,
    },
};

/// The entity stores, keyed by entity identity.
///
/// Owned by the factory while building, then moved into the repositories.
#[derive(Default)]
pub(crate) struct Stores {
    pub objects: SkipMap<Address, DumpObjectRc>,
    pub roots: SkipMap<Address, DumpObjectRootRc>,
    pub types: SkipMap<DumpTypeKey, DumpTypeRc>,
    pub modules: SkipMap<Address, DumpModuleRc>,
    pub app_domains: SkipMap<Address, DumpAppDomainRc>,
    pub threads: SkipMap<u32, DumpThreadRc>,
}

pub(crate) struct BuildContext<'a> {
    pub inspector: &'a dyn RuntimeInspector,
    pub config: BuildConfig,
    pub diagnostics: Arc<Diagnostics>,
    pub stats: BuildStats,
    pub stores: Stores,
}

impl<'a> BuildContext<'a> {
    pub fn new(inspector: &'a dyn RuntimeInspector, config: BuildConfig) -> Self {
        BuildContext {
            inspector,
            config,
            diagnostics: Arc::new(Diagnostics::new()),
            stats: BuildStats::default(),
            stores: Stores::default(),
        }
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        report(&self.diagnostics, diagnostic);
    }

    pub fn warning(
        &self,
        category: DiagnosticCategory,
        address: Option<Address>,
        message: impl Into<String>,
    ) {
        let mut diagnostic = Diagnostic::new(DiagnosticSeverity::Warning, category, message);
        diagnostic.address = address;
        self.report(diagnostic);
    }

    pub fn error(
        &self,
        category: DiagnosticCategory,
        address: Option<Address>,
        message: impl Into<String>,
    ) {
        let mut diagnostic = Diagnostic::new(DiagnosticSeverity::Error, category, message);
        diagnostic.address = address;
        self.report(diagnostic);
    }
}

/// Records `diagnostic` and mirrors it as a tracing event.
pub(crate) fn report(diagnostics: &Diagnostics, diagnostic: Diagnostic) {
    let category = diagnostic.category;
    let address = diagnostic.address.map(|a| a.to_string());
    let thread = diagnostic.os_thread_id;
    match diagnostic.severity {
        DiagnosticSeverity::Info => {
            tracing::info!(%category, ?address, ?thread, "{}", diagnostic.message);
        }
        DiagnosticSeverity::Warning => {
            tracing::warn!(%category, ?address, ?thread, "{}", diagnostic.message);
        }
        DiagnosticSeverity::Error => {
            tracing::error!(%category, ?address, ?thread, "{}", diagnostic.message);
        }
    }
    diagnostics.push(diagnostic);
}
