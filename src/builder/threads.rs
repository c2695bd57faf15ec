//! Thread pass: stacks, root joining and CPU times.

use std::{collections::HashSet, sync::Arc};

use crate::{
    builder::{context::BuildContext, objects::policy_admits, runaway::RunawayParser},
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity},
    inspector::ThreadDescriptor,
    model::{Address, DumpThread},
    Result,
};

/// Builds the thread store.
///
/// Threads are assembled privately, enriched with roots and timings, and only
/// then published to the store.
pub(crate) fn build_threads(ctx: &mut BuildContext<'_>) -> Result<()> {
    let span = tracing::info_span!("thread_pass");
    let _guard = span.enter();

    let descriptors = ctx.inspector.enumerate_threads()?;
    tracing::debug!(count = descriptors.len(), "extracting threads");

    let mut seen = HashSet::new();
    let mut threads = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        if !seen.insert(descriptor.os_id) {
            ctx.stats.duplicate_threads += 1;
            ctx.report(
                Diagnostic::new(
                    DiagnosticSeverity::Error,
                    DiagnosticCategory::Thread,
                    "thread os id reported twice, keeping the first, investigate manually",
                )
                .with_thread(descriptor.os_id),
            );
            continue;
        }

        let stack_frames = if ctx.config.capture_stack_frames {
            match ctx.inspector.enumerate_stack_frames(&descriptor) {
                Ok(frames) => frames,
                Err(e) => {
                    thread_warning(ctx, descriptor.os_id, format!("stack is unwalkable: {e}"));
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let roots = if ctx.config.root_policy.walks_stacks() {
            join_roots(ctx, &descriptor)
        } else {
            Vec::new()
        };

        threads.push(DumpThread {
            os_id: descriptor.os_id,
            managed_thread_id: descriptor.managed_thread_id,
            address: descriptor.address,
            app_domain: descriptor
                .app_domain
                .filter(|d| ctx.stores.app_domains.contains_key(d)),
            debugger_index: None,
            stack_frames,
            roots,
            user_mode_time: None,
            kernel_mode_time: None,
            elapsed_time: None,
            is_finalizer: descriptor.is_finalizer,
            is_background: descriptor.is_background,
        });
    }

    if ctx.config.collect_thread_times {
        apply_thread_times(ctx, &mut threads)?;
    }

    for thread in threads {
        ctx.stores.threads.insert(thread.os_id, Arc::new(thread));
    }

    ctx.stats.threads = ctx.stores.threads.len();
    tracing::info!(
        threads = ctx.stats.threads,
        dropped_roots = ctx.stats.thread_roots_dropped,
        "thread pass complete"
    );

    Ok(())
}

/// Joins the stack roots of `thread` against the global root store.
///
/// Roots the global walk did not report are dropped with a warning.
fn join_roots(ctx: &mut BuildContext<'_>, thread: &ThreadDescriptor) -> Vec<Address> {
    let stack_roots = match ctx.inspector.enumerate_stack_roots(thread) {
        Ok(roots) => roots,
        Err(e) => {
            thread_warning(ctx, thread.os_id, format!("stack roots are unavailable: {e}"));
            return Vec::new();
        }
    };

    let mut joined = Vec::with_capacity(stack_roots.len());
    let mut unique = HashSet::new();

    for root in stack_roots {
        if !policy_admits(ctx.config.root_policy, &root) || !unique.insert(root.address) {
            continue;
        }

        let Some(entry) = ctx.stores.roots.get(&root.address) else {
            ctx.stats.thread_roots_dropped += 1;
            ctx.report(
                Diagnostic::new(
                    DiagnosticSeverity::Warning,
                    DiagnosticCategory::Root,
                    format!(
                        "thread claims a root pointing at {} but the root walk did not report it",
                        root.object
                    ),
                )
                .with_address(root.address)
                .with_thread(thread.os_id),
            );
            continue;
        };

        let owner = entry.value();
        if !owner.claim(thread.os_id) {
            tracing::debug!(
                address = %root.address,
                owner = ?owner.thread(),
                os_id = thread.os_id,
                "root already claimed by another thread"
            );
        }
        joined.push(root.address);
    }

    joined
}

fn apply_thread_times(ctx: &mut BuildContext<'_>, threads: &mut [DumpThread]) -> Result<()> {
    let Some(text) = ctx.inspector.thread_timing_text() else {
        tracing::debug!("no thread timing text available");
        return Ok(());
    };
    tracing::debug!(bytes = text.len(), "applying thread timing text");

    let parser = RunawayParser::new()?;
    ctx.stats.thread_times = parser.apply(&text, threads);

    if ctx.stats.thread_times == 0 && !threads.is_empty() {
        ctx.report(Diagnostic::new(
            DiagnosticSeverity::Info,
            DiagnosticCategory::ThreadTiming,
            "thread timing text did not match any thread",
        ));
    }

    Ok(())
}

fn thread_warning(ctx: &BuildContext<'_>, os_id: u32, message: String) {
    ctx.report(
        Diagnostic::new(DiagnosticSeverity::Warning, DiagnosticCategory::Thread, message)
            .with_thread(os_id),
    );
}
