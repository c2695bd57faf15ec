//! Module and application domain lookups.

use crossbeam_skiplist::SkipMap;

use crate::{
    model::{Address, DumpAppDomainRc, DumpModuleRc},
    Error, Result,
};

/// Read access to the loaded modules of a snapshot.
pub struct DumpModuleRepository {
    modules: SkipMap<Address, DumpModuleRc>,
}

impl DumpModuleRepository {
    pub(crate) fn new(modules: SkipMap<Address, DumpModuleRc>) -> Self {
        DumpModuleRepository { modules }
    }

    /// Look up a module by the address it is stored under.
    ///
    /// That is the image base, or the module handle for modules without an image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleNotFound`] if no module is stored under `address`.
    pub fn get(&self, address: Address) -> Result<DumpModuleRc> {
        self.modules
            .get(&address)
            .map(|entry| entry.value().clone())
            .ok_or(Error::ModuleNotFound(address))
    }

    /// The first module whose name equals `name`, ignoring ASCII case
    pub fn by_name(&self, name: &str) -> Option<DumpModuleRc> {
        self.modules()
            .find(|module| module.name.eq_ignore_ascii_case(name))
    }

    /// Iterate all modules in address order.
    pub fn modules(&self) -> impl Iterator<Item = DumpModuleRc> + '_ {
        self.modules.iter().map(|entry| entry.value().clone())
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if no modules were loaded
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Read access to the application domains of a snapshot.
pub struct DumpAppDomainRepository {
    app_domains: SkipMap<Address, DumpAppDomainRc>,
}

impl DumpAppDomainRepository {
    pub(crate) fn new(app_domains: SkipMap<Address, DumpAppDomainRc>) -> Self {
        DumpAppDomainRepository { app_domains }
    }

    /// Look up a domain by address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AppDomainNotFound`] if no domain exists at `address`.
    pub fn get(&self, address: Address) -> Result<DumpAppDomainRc> {
        self.app_domains
            .get(&address)
            .map(|entry| entry.value().clone())
            .ok_or(Error::AppDomainNotFound(address))
    }

    /// Iterate all domains in address order.
    pub fn app_domains(&self) -> impl Iterator<Item = DumpAppDomainRc> + '_ {
        self.app_domains.iter().map(|entry| entry.value().clone())
    }

    /// Number of domains
    pub fn len(&self) -> usize {
        self.app_domains.len()
    }

    /// Returns true if no domains were found
    pub fn is_empty(&self) -> bool {
        self.app_domains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DumpAppDomain, DumpModule};
    use std::sync::Arc;

    #[test]
    fn test_module_lookup() {
        let modules = SkipMap::new();
        modules.insert(
            Address(0x4000),
            Arc::new(DumpModule::new(Address(0x4000), Some(Address(0x4000)), "Contoso.dll")),
        );
        let repository = DumpModuleRepository::new(modules);

        assert_eq!(repository.len(), 1);
        assert_eq!(repository.get(Address(0x4000)).unwrap().name, "Contoso.dll");
        assert!(repository.by_name("contoso.DLL").is_some());
        assert!(matches!(
            repository.get(Address(0x5000)),
            Err(Error::ModuleNotFound(a)) if a == Address(0x5000)
        ));
    }

    #[test]
    fn test_app_domain_lookup() {
        let domains = SkipMap::new();
        domains.insert(
            Address(0x20),
            Arc::new(DumpAppDomain::new(Address(0x20), Some("Site1".into()), None, None)),
        );
        domains.insert(
            Address(0x10),
            Arc::new(DumpAppDomain::new(Address(0x10), Some("Default".into()), None, None)),
        );
        let repository = DumpAppDomainRepository::new(domains);

        let names: Vec<_> = repository
            .app_domains()
            .filter_map(|d| d.name.clone())
            .collect();
        assert_eq!(names, vec!["Default".to_string(), "Site1".to_string()]);
        assert!(matches!(
            repository.get(Address(0x30)),
            Err(Error::AppDomainNotFound(_))
        ));
    }
}
