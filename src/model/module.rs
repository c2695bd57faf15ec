//! Loaded modules and the application domains hosting them.

use crate::model::{Address, DumpTypeKey};

/// A loaded binary module.
///
/// Modules and domains reference each other by address. Both link lists are
/// append-only and only written during the module/type pass.
#[derive(Debug)]
pub struct DumpModule {
    /// Store key: the image base, or the module handle for modules without one
    pub address: Address,
    /// Image base address, absent for dynamic (in-memory) modules
    pub image_base: Option<Address>,
    /// Module name
    pub name: String,
    /// Path of the file the module was loaded from
    pub file_name: Option<String>,
    /// Runtime assembly identifier
    pub assembly_id: u64,
    /// Name of the assembly containing the module
    pub assembly_name: Option<String>,
    /// Module was emitted at runtime
    pub is_dynamic: bool,
    /// Raw debugging-mode flags of the module
    pub debugging_mode: u32,
    types: boxcar::Vec<DumpTypeKey>,
    app_domains: boxcar::Vec<Address>,
}

impl DumpModule {
    /// Create a new module without types and domains
    pub fn new(address: Address, image_base: Option<Address>, name: impl Into<String>) -> Self {
        DumpModule {
            address,
            image_base,
            name: name.into(),
            file_name: None,
            assembly_id: 0,
            assembly_name: None,
            is_dynamic: false,
            debugging_mode: 0,
            types: boxcar::Vec::new(),
            app_domains: boxcar::Vec::new(),
        }
    }

    /// Keys of the types defined by this module
    pub fn types(&self) -> impl Iterator<Item = &DumpTypeKey> + '_ {
        self.types.iter().map(|(_, key)| key)
    }

    /// Number of types defined by this module
    pub fn type_count(&self) -> usize {
        self.types.count()
    }

    /// Addresses of the domains this module is loaded into
    pub fn app_domains(&self) -> impl Iterator<Item = Address> + '_ {
        self.app_domains.iter().map(|(_, address)| *address)
    }

    pub(crate) fn add_type(&self, key: DumpTypeKey) {
        self.types.push(key);
    }

    /// Links the domain unless it is already linked. Returns true if added.
    pub(crate) fn link_app_domain(&self, domain: Address) -> bool {
        if self.app_domains().any(|existing| existing == domain) {
            return false;
        }
        self.app_domains.push(domain);
        true
    }
}

/// An isolation domain within the process.
#[derive(Debug)]
pub struct DumpAppDomain {
    /// Address of the domain
    pub address: Address,
    /// Friendly name
    pub name: Option<String>,
    /// Configuration file path
    pub config_file: Option<String>,
    /// Application base directory
    pub application_base: Option<String>,
    modules: boxcar::Vec<Address>,
}

impl DumpAppDomain {
    /// Create a new domain without modules
    pub fn new(
        address: Address,
        name: Option<String>,
        config_file: Option<String>,
        application_base: Option<String>,
    ) -> Self {
        DumpAppDomain {
            address,
            name,
            config_file,
            application_base,
            modules: boxcar::Vec::new(),
        }
    }

    /// Keys of the modules loaded into this domain
    pub fn modules(&self) -> impl Iterator<Item = Address> + '_ {
        self.modules.iter().map(|(_, address)| *address)
    }

    /// Number of modules loaded into this domain
    pub fn module_count(&self) -> usize {
        self.modules.count()
    }

    pub(crate) fn link_module(&self, module: Address) -> bool {
        if self.modules().any(|existing| existing == module) {
            return false;
        }
        self.modules.push(module);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_domain_links_are_deduplicated() {
        let module = DumpModule::new(Address(0x4000), Some(Address(0x4000)), "Contoso.dll");
        assert!(module.link_app_domain(Address(0x10)));
        assert!(!module.link_app_domain(Address(0x10)));
        assert!(module.link_app_domain(Address(0x20)));
        assert_eq!(
            module.app_domains().collect::<Vec<_>>(),
            vec![Address(0x10), Address(0x20)]
        );

        let domain = DumpAppDomain::new(Address(0x10), Some("Default".into()), None, None);
        assert!(domain.link_module(Address(0x4000)));
        assert!(!domain.link_module(Address(0x4000)));
        assert_eq!(domain.module_count(), 1);
    }

    #[test]
    fn test_module_types() {
        let module = DumpModule::new(Address(0x1), None, "dynamic");
        module.add_type(DumpTypeKey::new(0x10, "A"));
        module.add_type(DumpTypeKey::new(0x18, "B"));
        assert_eq!(module.type_count(), 2);
        assert_eq!(module.types().next().map(|k| k.name.as_str()), Some("A"));
        assert!(module.image_base.is_none());
    }
}
