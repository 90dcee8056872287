//! The single resolution entry point.
//!
//! ```text
//! descriptors
//!     ↓ ModuleRegistry::from_descriptors   (duplicates, blank names)
//!     ↓ ModuleGraph::build                 (missing deps, self deps, conflicts)
//!     ↓ excise_cycles                      (cycles)
//!     ↓ propagate                          (closures, include paths, PCH)
//!     ↓ plan::compile                      (waves)
//! Resolution | DiagnosticList
//! ```
//!
//! Every stage runs even after an earlier one reported a fatal problem, so
//! one call returns the complete error report. The plan is withheld iff a
//! fatal diagnostic was recorded.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info, instrument};

use crate::config::ResolveConfig;
use crate::descriptor::ModuleDescriptor;
use crate::diagnostics::{Diagnostic, DiagnosticList, Diagnostics};
use crate::graph::{ModuleGraph, excise_cycles};
use crate::plan::{self, BuildPlan};
use crate::propagate::{self, ResolvedModule};
use crate::registry::{ModuleRegistry, RegistryError};

/// Resolve `descriptors` with the default [`ResolveConfig`].
///
/// # Errors
///
/// Returns every diagnostic of the pass if any of them is fatal.
pub fn resolve<I>(descriptors: I) -> Result<Resolution, DiagnosticList>
where
    I: IntoIterator<Item = ModuleDescriptor>,
{
    Resolver::default().resolve(descriptors)
}

/// Runs resolution passes with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolveConfig,
}

impl Resolver {
    #[must_use]
    pub const fn new(config: ResolveConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Run a full resolution pass.
    ///
    /// # Errors
    ///
    /// Returns the complete [`DiagnosticList`] (errors and warnings, in stage
    /// order) if any diagnostic is fatal, or if any warning was reported and
    /// `warnings_as_errors` is set.
    #[instrument(skip_all)]
    pub fn resolve<I>(&self, descriptors: I) -> Result<Resolution, DiagnosticList>
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        let mut diagnostics = Diagnostics::new();

        let registry = ModuleRegistry::from_descriptors(descriptors, &mut diagnostics);
        let mut graph = ModuleGraph::build(registry, &self.config, &mut diagnostics);
        let excised = excise_cycles(&mut graph, &mut diagnostics);
        let modules = propagate::propagate(&graph, &self.config, &mut diagnostics);
        let plan = plan::compile(&graph).map_err(|d| diagnostics.push(d)).ok();

        let blocked = diagnostics.has_fatal()
            || (self.config.warnings_as_errors && !diagnostics.is_empty());

        let plan = match plan {
            Some(plan) if !blocked => plan,
            _ => {
                debug!(
                    diagnostics = diagnostics.len(),
                    excised = excised.len(),
                    "resolution failed"
                );
                return Err(diagnostics.into_list());
            }
        };

        info!(
            modules = modules.len(),
            waves = plan.wave_count(),
            warnings = diagnostics.len(),
            "resolution complete"
        );

        Ok(Resolution::new(
            plan,
            modules,
            diagnostics.into_vec(),
            graph.content_hash().to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Output of a successful pass: the build plan plus per-module query results.
///
/// Immutable; safe to share across the threads that execute the plan.
#[derive(Debug, Clone)]
pub struct Resolution {
    plan: BuildPlan,
    modules: Vec<ResolvedModule>,
    index: HashMap<String, usize>,
    warnings: Vec<Diagnostic>,
    content_hash: String,
}

impl Resolution {
    fn new(
        plan: BuildPlan,
        modules: Vec<ResolvedModule>,
        warnings: Vec<Diagnostic>,
        content_hash: String,
    ) -> Self {
        let index = modules
            .iter()
            .enumerate()
            .map(|(pos, module)| (module.name.clone(), pos))
            .collect();
        Self {
            plan,
            modules,
            index,
            warnings,
            content_hash,
        }
    }

    #[must_use]
    pub const fn plan(&self) -> &BuildPlan {
        &self.plan
    }

    #[must_use]
    pub fn into_plan(self) -> BuildPlan {
        self.plan
    }

    /// Non-fatal diagnostics of the pass.
    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// BLAKE3 hash of the declared, resolvable edge set.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Resolved modules in registration order.
    pub fn modules(&self) -> std::slice::Iter<'_, ResolvedModule> {
        self.modules.iter()
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownModule`] for an unregistered name.
    pub fn module(&self, name: &str) -> Result<&ResolvedModule, RegistryError> {
        self.index
            .get(name)
            .and_then(|&pos| self.modules.get(pos))
            .ok_or_else(|| RegistryError::UnknownModule(name.to_string()))
    }

    /// Own include paths plus the public include paths of the module's
    /// transitive public dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownModule`] for an unregistered name.
    pub fn effective_include_paths(&self, name: &str) -> Result<&[String], RegistryError> {
        Ok(&self.module(name)?.effective_include_paths)
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownModule`] for an unregistered name.
    pub fn is_pch_eligible(&self, name: &str) -> Result<bool, RegistryError> {
        Ok(self.module(name)?.pch_eligible)
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownModule`] for an unregistered name.
    pub fn transitive_public_dependencies(
        &self,
        name: &str,
    ) -> Result<&BTreeSet<String>, RegistryError> {
        Ok(&self.module(name)?.public_closure)
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownModule`] for an unregistered name.
    pub fn dynamically_loaded_modules(&self, name: &str) -> Result<&[String], RegistryError> {
        Ok(&self.module(name)?.dynamically_loaded_modules)
    }
}
