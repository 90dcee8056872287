//! In-memory model of one module's declared build rules.
//!
//! A [`ModuleDescriptor`] is the leaf input to the resolver. It is produced by
//! whatever descriptor source the surrounding driver uses (files, generated
//! code, a test fixture) and handed to [`crate::registry::ModuleRegistry`].
//!
//! # Ordered sets
//!
//! Every list on a descriptor is an ordered set: declaration order is
//! preserved because it drives edge iteration order, diagnostic order and
//! include-path order. Repeated entries are collapsed by
//! [`ModuleDescriptor::normalize`], keeping the first occurrence.
//!
//! # File representation
//!
//! Descriptors derive `serde` so a driver can read them from TOML, JSON or
//! YAML. Only `name` is required. Unknown keys are rejected; free-form
//! settings belong under `metadata`:
//!
//! ```toml
//! name = "CommonMaps"
//! pch_usage = "UseExplicitOrSharedPCHs"
//! public_dependencies = ["Core"]
//! private_dependencies = ["Engine", "Slate"]
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PchUsage
// ---------------------------------------------------------------------------

/// Precompiled-header policy declared by a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PchUsage {
    /// The module does not use precompiled headers at all.
    #[default]
    #[serde(alias = "NoPCHs")]
    None,
    /// The module may reuse a shared PCH, or fall back to its own.
    #[serde(alias = "UseExplicitOrSharedPCHs", alias = "UseSharedPCHs")]
    UseSharedOrExplicit,
    /// The module only ever uses its own explicit PCH.
    #[serde(alias = "NoSharedPCHs")]
    UseExplicitOnly,
}

impl PchUsage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::UseSharedOrExplicit => "use_shared_or_explicit",
            Self::UseExplicitOnly => "use_explicit_only",
        }
    }

    /// Whether the module uses any precompiled header.
    #[must_use]
    pub const fn uses_pch(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Whether the module is willing to reuse a shared PCH.
    #[must_use]
    pub const fn wants_shared(self) -> bool {
        matches!(self, Self::UseSharedOrExplicit)
    }
}

impl fmt::Display for PchUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Whether a dependency's interface propagates to the declaring module's
/// dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ModuleDescriptor
// ---------------------------------------------------------------------------

/// Declared rules for a single module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDescriptor {
    /// Unique, case-sensitive module name.
    pub name: String,
    #[serde(default)]
    pub pch_usage: PchUsage,
    /// Include paths exposed to this module and to everything that depends
    /// on it publicly.
    #[serde(default)]
    pub public_include_paths: Vec<String>,
    /// Include paths visible to this module only.
    #[serde(default)]
    pub private_include_paths: Vec<String>,
    /// Modules loaded at runtime. Weak references: never build-order edges.
    #[serde(default)]
    pub dynamically_loaded_modules: Vec<String>,
    #[serde(default)]
    pub public_dependencies: Vec<String>,
    #[serde(default)]
    pub private_dependencies: Vec<String>,
    /// Opaque settings carried through resolution untouched.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ModuleDescriptor {
    /// Create a descriptor with no dependencies, no include paths and no PCH.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_pch_usage(mut self, pch_usage: PchUsage) -> Self {
        self.pch_usage = pch_usage;
        self
    }

    #[must_use]
    pub fn with_public_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_dependencies.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_private_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.private_dependencies.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_public_include_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_include_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_private_include_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.private_include_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_dynamically_loaded_modules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dynamically_loaded_modules
            .extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Collapse repeated entries in every list, keeping first occurrences.
    pub fn normalize(&mut self) {
        dedup_in_order(&mut self.public_include_paths);
        dedup_in_order(&mut self.private_include_paths);
        dedup_in_order(&mut self.dynamically_loaded_modules);
        dedup_in_order(&mut self.public_dependencies);
        dedup_in_order(&mut self.private_dependencies);
    }

    /// All declared build dependencies: public first, then private, each in
    /// declaration order.
    pub fn dependencies(&self) -> impl Iterator<Item = (&str, Visibility)> {
        self.public_dependencies
            .iter()
            .map(|name| (name.as_str(), Visibility::Public))
            .chain(
                self.private_dependencies
                    .iter()
                    .map(|name| (name.as_str(), Visibility::Private)),
            )
    }

    /// Own include paths: public first, then private.
    pub fn own_include_paths(&self) -> impl Iterator<Item = &str> {
        self.public_include_paths
            .iter()
            .chain(&self.private_include_paths)
            .map(String::as_str)
    }
}

fn dedup_in_order(values: &mut Vec<String>) {
    let mut seen: HashSet<String> = HashSet::with_capacity(values.len());
    values.retain(|value| seen.insert(value.clone()));
}
