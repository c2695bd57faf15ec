//! Module, domain and type pass.

use std::sync::Arc;

use crate::{
    builder::context::BuildContext,
    diagnostics::DiagnosticCategory,
    inspector::{AppDomainDescriptor, ModuleDescriptor},
    model::{DumpAppDomain, DumpModule, DumpModuleRc, DumpType, DumpTypeKey},
    Result,
};

/// Builds the module, domain and type stores.
///
/// Base types are linked in a deferred pass once every module's types are known,
/// since a base type may live in a module enumerated later.
pub(crate) fn build_modules_and_types(ctx: &mut BuildContext<'_>) -> Result<()> {
    let span = tracing::info_span!("module_pass");
    let _guard = span.enter();

    let modules = ctx.inspector.enumerate_modules()?;
    tracing::debug!(count = modules.len(), "extracting modules, app domains and types");

    let mut base_links: Vec<(DumpTypeKey, DumpTypeKey)> = Vec::new();

    for descriptor in &modules {
        let module = module_for(ctx, descriptor);

        for domain in &descriptor.app_domains {
            let domain = domain_for(ctx, domain);
            module.link_app_domain(domain.address);
            domain.link_module(module.address);
        }

        let types = match ctx.inspector.enumerate_types(descriptor) {
            Ok(types) => types,
            Err(e) => {
                ctx.error(
                    DiagnosticCategory::Type,
                    Some(module.address),
                    format!(
                        "could not enumerate types of module {}, keeping it without types: {e}",
                        descriptor.name
                    ),
                );
                continue;
            }
        };

        for ty in types {
            let Some(key) = ty.key() else {
                tracing::trace!(
                    method_table = ty.method_table,
                    "skipping unnamed runtime type"
                );
                continue;
            };

            if ctx.stores.types.contains_key(&key) {
                continue;
            }

            if let Some(base) = ty.base {
                base_links.push((key.clone(), base));
            }

            module.add_type(key.clone());
            let dump_type = DumpType::new(key.clone(), Some(module.address), ty.base_size, ty.flags);
            ctx.stores.types.insert(key, Arc::new(dump_type));
        }
    }

    for (key, base) in base_links {
        let Some(ty) = ctx.stores.types.get(&key) else {
            continue;
        };

        if ctx.stores.types.contains_key(&base) {
            ty.value().set_base(base);
        } else {
            ctx.stats.unresolved_base_types += 1;
            ctx.warning(
                DiagnosticCategory::Type,
                None,
                format!("base type {base} of {key} was not loaded by any module"),
            );
        }
    }

    ctx.stats.modules = ctx.stores.modules.len();
    ctx.stats.app_domains = ctx.stores.app_domains.len();
    ctx.stats.types = ctx.stores.types.len();
    tracing::info!(
        modules = ctx.stats.modules,
        app_domains = ctx.stats.app_domains,
        types = ctx.stats.types,
        "module pass complete"
    );

    Ok(())
}

fn module_for(ctx: &BuildContext<'_>, descriptor: &ModuleDescriptor) -> DumpModuleRc {
    let key = descriptor.key();
    if let Some(existing) = ctx.stores.modules.get(&key) {
        return existing.value().clone();
    }

    let image_base = (!descriptor.image_base.is_null()).then_some(descriptor.image_base);
    let mut module = DumpModule::new(key, image_base, descriptor.name.clone());
    module.file_name = descriptor.file_name.clone();
    module.assembly_id = descriptor.assembly_id;
    module.assembly_name = descriptor.assembly_name.clone();
    module.is_dynamic = descriptor.is_dynamic;
    module.debugging_mode = descriptor.debugging_mode;

    let module = Arc::new(module);
    ctx.stores.modules.insert(key, module.clone());
    module
}

fn domain_for(ctx: &BuildContext<'_>, descriptor: &AppDomainDescriptor) -> Arc<DumpAppDomain> {
    if let Some(existing) = ctx.stores.app_domains.get(&descriptor.address) {
        return existing.value().clone();
    }

    let domain = Arc::new(DumpAppDomain::new(
        descriptor.address,
        descriptor.name.clone(),
        descriptor.config_file.clone(),
        descriptor.application_base.clone(),
    ));
    ctx.stores
        .app_domains
        .insert(descriptor.address, domain.clone());
    domain
}
