use serde::{Deserialize, Serialize};

/// Knobs for a resolution pass.
///
/// Deserializes from the `[resolve]` table of a driver config file; every
/// field has a default so an empty table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Treat unresolvable dynamically-loaded module names as errors.
    #[serde(default)]
    pub strict_dynamic_modules: bool,
    /// Withhold the build plan when any warning is reported.
    #[serde(default)]
    pub warnings_as_errors: bool,
    /// Emit a diagnostic for each module whose PCH sharing gets disabled.
    /// Sharing is disabled either way.
    #[serde(default = "default_true")]
    pub report_pch_conflicts: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            strict_dynamic_modules: false,
            warnings_as_errors: false,
            report_pch_conflicts: default_true(),
        }
    }
}

const fn default_true() -> bool {
    true
}
