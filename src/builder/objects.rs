//! Object pass and global root pass.

use std::{collections::HashMap, sync::Arc};

use crate::{
    builder::context::BuildContext,
    config::RootWalkPolicy,
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity},
    error::Error,
    extraction::ExtractorRegistry,
    inspector::{ObjectDescriptor, RootDescriptor},
    model::{Address, DumpObject, DumpObjectRoot, DumpTypeKey, DumpTypeRc, GcRootKind, RootFlags},
    Result,
};

/// Outbound references recorded during the object pass, consumed by the linker.
pub(crate) type Adjacency = HashMap<Address, Vec<Address>>;

/// Builds the object store through the extractor registry.
///
/// Reference addresses are collected into the returned adjacency map and not
/// attached to any object; edges are only established once every object exists.
pub(crate) fn build_objects(
    ctx: &mut BuildContext<'_>,
    registry: &ExtractorRegistry,
) -> Result<Adjacency> {
    let span = tracing::info_span!("object_pass");
    let _guard = span.enter();

    let inspector = ctx.inspector;
    let mut adjacency = Adjacency::new();

    for descriptor in inspector.enumerate_objects()? {
        if descriptor.address.is_null() || descriptor.is_free {
            ctx.stats.free_skipped += 1;
            continue;
        }

        let Some((key, dump_type)) = admit(ctx, &descriptor)? else {
            ctx.stats.objects_excluded += 1;
            continue;
        };

        let extracted = registry.extract(&descriptor, inspector);
        if let Some(failure) = &extracted.failure {
            ctx.stats.extractor_fallbacks += 1;
            let what = if failure.panicked { "panicked" } else { "failed" };
            ctx.warning(
                DiagnosticCategory::Extraction,
                Some(descriptor.address),
                format!(
                    "extractor '{}' {what} on {} object, using generic extraction: {}",
                    failure.extractor, key.name, failure.message
                ),
            );
        }

        let address = descriptor.address;
        let object = DumpObject::new(
            address,
            key,
            descriptor.size,
            descriptor.generation,
            extracted.payload,
            extracted.extractor,
        );
        dump_type.add_object(address);
        ctx.stores.objects.insert(address, Arc::new(object));

        match inspector.enumerate_references(address) {
            Ok(children) if !children.is_empty() => {
                adjacency.insert(address, children);
            }
            Ok(_) => {}
            Err(e) => ctx.warning(
                DiagnosticCategory::Reference,
                Some(address),
                format!("could not enumerate references, object has no outbound edges: {e}"),
            ),
        }
    }

    ctx.stats.objects = ctx.stores.objects.len();
    tracing::info!(
        objects = ctx.stats.objects,
        excluded = ctx.stats.objects_excluded,
        fallbacks = ctx.stats.extractor_fallbacks,
        "object pass complete"
    );

    Ok(adjacency)
}

/// Resolves the object's type and checks that its address is unused.
///
/// Returns `Ok(None)` for objects that are excluded but do not abort the build.
fn admit(
    ctx: &BuildContext<'_>,
    descriptor: &ObjectDescriptor,
) -> Result<Option<(DumpTypeKey, DumpTypeRc)>> {
    let address = descriptor.address;

    let Some(key) = descriptor.type_key() else {
        ctx.error(
            DiagnosticCategory::Object,
            Some(address),
            format!(
                "type of object with method table 0x{:x} could not be resolved",
                descriptor.method_table
            ),
        );
        return Ok(None);
    };

    let Some(dump_type) = ctx.stores.types.get(&key).map(|e| e.value().clone()) else {
        if ctx.config.strict {
            return Err(Error::UnknownObjectType { address, key });
        }
        ctx.error(
            DiagnosticCategory::Object,
            Some(address),
            format!("object references type {key} which was not discovered in any module"),
        );
        return Ok(None);
    };

    if let Some(existing) = ctx.stores.objects.get(&address) {
        let existing = existing.value().type_key.clone();
        if ctx.config.strict {
            return Err(Error::DuplicateAddress {
                address,
                existing,
                incoming: key,
            });
        }
        ctx.error(
            DiagnosticCategory::Object,
            Some(address),
            format!("duplicate object address (types {existing} and {key}), keeping the first"),
        );
        return Ok(None);
    }

    Ok(Some((key, dump_type)))
}

/// Returns true if `policy` keeps `root`.
pub(crate) fn policy_admits(policy: RootWalkPolicy, root: &RootDescriptor) -> bool {
    if !policy.walks_stacks() && root.kind == GcRootKind::LocalVar {
        return false;
    }
    policy.keeps_possible_false_positives()
        || !root.flags.contains(RootFlags::POSSIBLE_FALSE_POSITIVE)
}

/// Builds the global root store.
///
/// Runs once for the whole process, after the object store is complete so that
/// every root can be linked to its object.
pub(crate) fn build_roots(ctx: &mut BuildContext<'_>) -> Result<()> {
    let span = tracing::info_span!("root_pass");
    let _guard = span.enter();

    let roots = ctx.inspector.enumerate_roots(ctx.config.root_policy)?;
    tracing::debug!(count = roots.len(), "extracting object roots");

    for root in roots {
        if !policy_admits(ctx.config.root_policy, &root) {
            ctx.stats.roots_filtered += 1;
            continue;
        }

        if ctx.stores.roots.contains_key(&root.address) {
            tracing::debug!(address = %root.address, "root reported twice, keeping the first");
            continue;
        }

        let mut entity =
            DumpObjectRoot::new(root.address, root.name, root.kind, root.flags, root.object);

        if ctx.stores.objects.contains_key(&root.object) {
            entity.rooted_object = Some(root.object);
        } else {
            tracing::debug!(
                address = %root.address,
                object = %root.object,
                "root points outside the object store"
            );
        }

        if let Some(domain) = root.app_domain {
            if ctx.stores.app_domains.contains_key(&domain) {
                entity.app_domain = Some(domain);
            } else {
                ctx.report(
                    Diagnostic::new(
                        DiagnosticSeverity::Info,
                        DiagnosticCategory::Root,
                        format!("root names unknown app domain {domain}"),
                    )
                    .with_address(root.address),
                );
            }
        }

        ctx.stores.roots.insert(root.address, Arc::new(entity));
    }

    ctx.stats.roots = ctx.stores.roots.len();
    tracing::info!(
        roots = ctx.stats.roots,
        filtered = ctx.stats.roots_filtered,
        "root pass complete"
    );

    Ok(())
}
