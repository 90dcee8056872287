//! Name → descriptor mapping for one resolution pass.
//!
//! The registry is write-once, read-many: descriptors are registered up
//! front and never removed. It is the sole owner of every
//! [`ModuleDescriptor`]; all other components refer to modules by name.
//! Iteration follows registration order, which is the declaration order the
//! rest of the pipeline relies on for determinism.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::descriptor::ModuleDescriptor;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ErrorCode;

/// Registration and lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("module '{0}' is already registered")]
    DuplicateModule(String),
    #[error("module name must not be empty")]
    EmptyName,
    #[error("unknown module '{0}'")]
    UnknownModule(String),
}

impl RegistryError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicateModule(_) => ErrorCode::DuplicateModule,
            Self::EmptyName => ErrorCode::InvalidDescriptor,
            Self::UnknownModule(_) => ErrorCode::UnknownModule,
        }
    }
}

/// Owner of every module descriptor in a pass.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
    index: HashMap<String, usize>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every descriptor, converting registration failures into
    /// diagnostics instead of stopping at the first one.
    ///
    /// The first declaration of a duplicated name wins.
    #[instrument(skip_all)]
    pub fn from_descriptors<I>(descriptors: I, diagnostics: &mut Diagnostics) -> Self
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        let mut registry = Self::new();
        for descriptor in descriptors {
            let name = descriptor.name.clone();
            match registry.register(descriptor) {
                Ok(()) => {}
                Err(RegistryError::DuplicateModule(_)) => {
                    diagnostics.push(Diagnostic::duplicate_module(&name));
                }
                Err(RegistryError::EmptyName) => {
                    diagnostics.push(Diagnostic::invalid_descriptor(
                        &name,
                        "module name must not be empty",
                    ));
                }
                Err(RegistryError::UnknownModule(_)) => {}
            }
        }
        debug!(modules = registry.len(), "registry populated");
        registry
    }

    /// Add a descriptor. Its lists are normalized on the way in.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyName`] for a blank name and
    /// [`RegistryError::DuplicateModule`] if the name is already taken.
    pub fn register(&mut self, mut descriptor: ModuleDescriptor) -> Result<(), RegistryError> {
        if descriptor.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.index.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateModule(descriptor.name));
        }

        descriptor.normalize();
        self.index
            .insert(descriptor.name.clone(), self.modules.len());
        self.modules.push(descriptor);
        Ok(())
    }

    /// Look up a descriptor by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownModule`] if no module has that name.
    pub fn lookup(&self, name: &str) -> Result<&ModuleDescriptor, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::UnknownModule(name.to_string()))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.index.get(name).map(|&pos| &self.modules[pos])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registration position of a module.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ModuleDescriptor> {
        self.modules.iter()
    }
}

impl<'a> IntoIterator for &'a ModuleRegistry {
    type Item = &'a ModuleDescriptor;
    type IntoIter = std::slice::Iter<'a, ModuleDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;

    #[test]
    fn register_then_lookup() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleDescriptor::new("Core"))
            .expect("register Core");

        assert_eq!(registry.lookup("Core").expect("Core").name, "Core");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleDescriptor::new("Core"))
            .expect("register Core");

        assert_eq!(
            registry.lookup("core"),
            Err(RegistryError::UnknownModule("core".to_string()))
        );
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleDescriptor::new("Core"))
            .expect("first register");

        let err = registry
            .register(ModuleDescriptor::new("Core"))
            .expect_err("duplicate must fail");
        assert_eq!(err, RegistryError::DuplicateModule("Core".to_string()));
        assert_eq!(err.code(), ErrorCode::DuplicateModule);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut registry = ModuleRegistry::new();
        assert_eq!(
            registry.register(ModuleDescriptor::new("  ")),
            Err(RegistryError::EmptyName)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn iteration_follows_registration_order() {
        let mut registry = ModuleRegistry::new();
        for name in ["Zeta", "Alpha", "Mid"] {
            registry
                .register(ModuleDescriptor::new(name))
                .expect("register");
        }

        let names: Vec<&str> = registry.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(registry.position("Alpha"), Some(1));
    }

    #[test]
    fn from_descriptors_collects_every_failure() {
        let mut diagnostics = Diagnostics::new();
        let registry = ModuleRegistry::from_descriptors(
            [
                ModuleDescriptor::new("Core"),
                ModuleDescriptor::new("Core").with_public_dependencies(["Other"]),
                ModuleDescriptor::new(""),
                ModuleDescriptor::new("Engine"),
                ModuleDescriptor::new("Engine"),
            ],
            &mut diagnostics,
        );

        assert_eq!(registry.len(), 2);
        // First declaration wins.
        assert!(registry.lookup("Core").expect("Core").public_dependencies.is_empty());

        let kinds: Vec<_> = diagnostics.all().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::DuplicateModule,
                DiagnosticKind::InvalidDescriptor,
                DiagnosticKind::DuplicateModule,
            ]
        );
        assert!(diagnostics.has_fatal());
    }

    #[test]
    fn register_normalizes_lists() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleDescriptor::new("A").with_private_dependencies(["B", "B"]))
            .expect("register");
        assert_eq!(
            registry.lookup("A").expect("A").private_dependencies,
            vec!["B"]
        );
    }
}
