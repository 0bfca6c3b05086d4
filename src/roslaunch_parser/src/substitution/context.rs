//! Per-run lookup context for substitutions

use crate::system::{EnvironmentAccess, PackageLookup};
use std::{cell::RefCell, collections::HashMap};

/// Collaborators used while resolving substitutions during one interpretation.
///
/// `find` and `env` answers are memoized for the lifetime of the context, which
/// never outlives a single `interpret` call.
pub struct SubstitutionContext<'a> {
    packages: &'a dyn PackageLookup,
    environment: &'a dyn EnvironmentAccess,
    package_cache: RefCell<HashMap<String, Option<String>>>,
    env_cache: RefCell<HashMap<String, Option<String>>>,
}

impl<'a> SubstitutionContext<'a> {
    pub fn new(packages: &'a dyn PackageLookup, environment: &'a dyn EnvironmentAccess) -> Self {
        Self {
            packages,
            environment,
            package_cache: RefCell::new(HashMap::new()),
            env_cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn find_package(&self, name: &str) -> Option<String> {
        if let Some(cached) = self.package_cache.borrow().get(name) {
            return cached.clone();
        }
        let found = self
            .packages
            .find_package(name)
            .map(|path| path.to_string_lossy().into_owned());
        log::debug!("Package lookup '{}' -> {:?}", name, found);
        self.package_cache
            .borrow_mut()
            .insert(name.to_string(), found.clone());
        found
    }

    pub fn env_var(&self, name: &str) -> Option<String> {
        if let Some(cached) = self.env_cache.borrow().get(name) {
            return cached.clone();
        }
        let value = self.environment.get(name);
        self.env_cache
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        value
    }
}
