//! Best-effort multi-error collection for a resolution pass.
//!
//! Every stage appends to a shared [`Diagnostics`] reporter instead of
//! returning early, so a single call to [`crate::resolve`] reports every
//! missing dependency, every cycle and every descriptor problem at once.
//! The pass refuses to emit a build plan iff [`Diagnostics::has_fatal`].

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::descriptor::{PchUsage, Visibility};
use crate::error::ErrorCode;

// ---------------------------------------------------------------------------
// Kinds and severities
// ---------------------------------------------------------------------------

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    DuplicateModule,
    InvalidDescriptor,
    MissingDependency,
    DependencyCycle,
    ConflictingDependencyVisibility,
    UnresolvedDynamicModule,
    IncompatiblePchPolicy,
    InternalConsistency,
}

impl DiagnosticKind {
    #[must_use]
    pub const fn code(self) -> ErrorCode {
        match self {
            Self::DuplicateModule => ErrorCode::DuplicateModule,
            Self::InvalidDescriptor => ErrorCode::InvalidDescriptor,
            Self::MissingDependency => ErrorCode::MissingDependency,
            Self::DependencyCycle => ErrorCode::DependencyCycle,
            Self::ConflictingDependencyVisibility => ErrorCode::ConflictingDependencyVisibility,
            Self::UnresolvedDynamicModule => ErrorCode::UnresolvedDynamicModule,
            Self::IncompatiblePchPolicy => ErrorCode::IncompatiblePchPolicy,
            Self::InternalConsistency => ErrorCode::InternalConsistency,
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> Severity {
        if self.code().is_warning() {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}

/// Whether a diagnostic blocks plan emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A dependency edge named by a diagnostic: `from` depends on `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DiagnosticEdge {
    pub from: String,
    pub to: String,
    pub visibility: Visibility,
}

impl DiagnosticEdge {
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            visibility,
        }
    }
}

impl fmt::Display for DiagnosticEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -({})-> {}", self.from, self.visibility, self.to)
    }
}

/// One reported problem.
///
/// For [`DiagnosticKind::DependencyCycle`], `modules` holds the closed cycle
/// path (first and last entries are the same module).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub code: &'static str,
    pub modules: Vec<String>,
    pub edges: Vec<DiagnosticEdge>,
    pub detail: String,
}

impl Diagnostic {
    fn new(
        kind: DiagnosticKind,
        modules: Vec<String>,
        edges: Vec<DiagnosticEdge>,
        detail: String,
    ) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            code: kind.code().code(),
            modules,
            edges,
            detail,
        }
    }

    #[must_use]
    pub fn duplicate_module(name: &str) -> Self {
        Self::new(
            DiagnosticKind::DuplicateModule,
            vec![name.to_string()],
            Vec::new(),
            format!("module '{name}' is declared more than once; later declarations are ignored"),
        )
    }

    #[must_use]
    pub fn invalid_descriptor(name: &str, reason: &str) -> Self {
        Self::new(
            DiagnosticKind::InvalidDescriptor,
            vec![name.to_string()],
            Vec::new(),
            format!("descriptor '{name}' is invalid: {reason}"),
        )
    }

    #[must_use]
    pub fn missing_dependency(module: &str, missing: &str, visibility: Visibility) -> Self {
        Self::new(
            DiagnosticKind::MissingDependency,
            vec![module.to_string(), missing.to_string()],
            vec![DiagnosticEdge::new(module, missing, visibility)],
            format!("module '{module}' declares {visibility} dependency '{missing}', which is not registered"),
        )
    }

    /// A dependency cycle. `path` must be closed: `[A, B, A]`.
    #[must_use]
    pub fn dependency_cycle(path: Vec<String>, closing: DiagnosticEdge) -> Self {
        let detail = if path.len() <= 2 {
            format!("module '{}' depends on itself", closing.from)
        } else {
            format!(
                "dependency cycle ({} modules): {}",
                path.len() - 1,
                path.join(" → ")
            )
        };
        Self::new(DiagnosticKind::DependencyCycle, path, vec![closing], detail)
    }

    #[must_use]
    pub fn conflicting_visibility(module: &str, dependency: &str) -> Self {
        Self::new(
            DiagnosticKind::ConflictingDependencyVisibility,
            vec![module.to_string(), dependency.to_string()],
            vec![
                DiagnosticEdge::new(module, dependency, Visibility::Public),
                DiagnosticEdge::new(module, dependency, Visibility::Private),
            ],
            format!("module '{module}' declares '{dependency}' as both a public and a private dependency"),
        )
    }

    #[must_use]
    pub fn unresolved_dynamic_module(module: &str, name: &str, strict: bool) -> Self {
        let mut diagnostic = Self::new(
            DiagnosticKind::UnresolvedDynamicModule,
            vec![module.to_string(), name.to_string()],
            Vec::new(),
            format!("module '{module}' dynamically loads '{name}', which is not registered"),
        );
        if strict {
            diagnostic.severity = Severity::Error;
        }
        diagnostic
    }

    /// A shared-PCH module with direct dependencies that use no PCH.
    #[must_use]
    pub fn incompatible_pch_policy(module: &str, offenders: &[(String, PchUsage)]) -> Self {
        let mut modules = Vec::with_capacity(offenders.len() + 1);
        modules.push(module.to_string());
        modules.extend(offenders.iter().map(|(name, _)| name.clone()));

        let listed = offenders
            .iter()
            .map(|(name, usage)| format!("{name} ({usage})"))
            .collect::<Vec<_>>()
            .join(", ");

        Self::new(
            DiagnosticKind::IncompatiblePchPolicy,
            modules,
            Vec::new(),
            format!("module '{module}' wants a shared PCH but depends on modules without one: {listed}; PCH sharing disabled"),
        )
    }

    #[must_use]
    pub fn internal_consistency(stuck: Vec<String>) -> Self {
        let detail = format!(
            "wave construction made no progress with {} module(s) unplaced: {}",
            stuck.len(),
            stuck.join(", ")
        );
        Self::new(DiagnosticKind::InternalConsistency, stuck, Vec::new(), detail)
    }

    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// The closed cycle path, for cycle diagnostics.
    #[must_use]
    pub fn cycle_path(&self) -> Option<&[String]> {
        matches!(self.kind, DiagnosticKind::DependencyCycle).then_some(self.modules.as_slice())
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.kind.code().hint()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.code, self.severity, self.detail)
    }
}

// ---------------------------------------------------------------------------
// Diagnostics reporter
// ---------------------------------------------------------------------------

/// Ordered accumulator shared by all stages of one resolution pass.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_fatal() {
            debug!(code = diagnostic.code, "{}", diagnostic.detail);
        } else {
            warn!(code = diagnostic.code, "{}", diagnostic.detail);
        }
        self.entries.push(diagnostic);
    }

    /// True if any error-severity diagnostic has been recorded.
    #[must_use]
    pub fn has_fatal(&self) -> bool {
        self.entries.iter().any(Diagnostic::is_fatal)
    }

    /// Every diagnostic in the order it was recorded.
    #[must_use]
    pub fn all(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.is_fatal())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| !d.is_fatal())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    #[must_use]
    pub fn into_list(self) -> DiagnosticList {
        DiagnosticList {
            diagnostics: self.entries,
        }
    }
}

// ---------------------------------------------------------------------------
// DiagnosticList
// ---------------------------------------------------------------------------

/// The error returned by a failed resolution pass: every diagnostic the pass
/// produced, errors and warnings, in stage order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{}", self.summary())]
pub struct DiagnosticList {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticList {
    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_fatal)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_fatal()).count()
    }

    /// Diagnostics of one kind, in recorded order.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

impl IntoIterator for DiagnosticList {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticList {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

impl DiagnosticList {
    /// One-line count summary followed by each diagnostic on its own line.
    #[must_use]
    pub fn summary(&self) -> String {
        let errors = self.error_count();
        let warnings = self.diagnostics.len() - errors;
        let mut out =
            format!("module resolution failed: {errors} error(s), {warnings} warning(s)");
        for diagnostic in &self.diagnostics {
            out.push_str("\n  ");
            out.push_str(&diagnostic.to_string());
        }
        out
    }
}
