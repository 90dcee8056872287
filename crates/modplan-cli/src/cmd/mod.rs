//! Subcommand handlers and the loading/resolution steps they share.

pub mod check;
pub mod completions;
pub mod plan;
pub mod show;

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use modplan_core::{Diagnostic, DiagnosticList, Resolution, Resolver};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::config::{ProjectConfig, load_project_config, load_user_config};
use crate::output::{
    OutputMode, pretty_kv, pretty_section, render_mode, resolve_output_mode,
    write_diagnostics_pretty, write_diagnostics_text,
};
use crate::source;

/// Global output flags, forwarded from the top-level parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFlags {
    pub format: Option<OutputMode>,
    pub json: bool,
}

/// A descriptor root plus the configuration that applies to it.
#[derive(Debug)]
pub struct Session {
    pub root: PathBuf,
    pub project: ProjectConfig,
    pub mode: OutputMode,
}

/// Result of loading and resolving a descriptor root.
pub struct Outcome {
    pub descriptors: usize,
    pub result: std::result::Result<Resolution, DiagnosticList>,
}

impl Session {
    /// Load project and user configuration for `root` (default: the
    /// current directory) and settle the output mode.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn open(root: Option<&Path>, flags: OutputFlags) -> Result<Self> {
        let root = root.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let project = load_project_config(&root)?;
        let user = load_user_config()?;
        let mode = resolve_output_mode(
            flags.format,
            flags.json,
            project.output.format.as_deref(),
            user.output.as_deref(),
        );
        debug!(root = %root.display(), ?mode, "session opened");
        Ok(Self {
            root,
            project,
            mode,
        })
    }

    /// Load every descriptor under the root and resolve them.
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O and parse failures; resolution
    /// problems are carried in [`Outcome::result`].
    #[instrument(skip_all)]
    pub fn resolve(&self) -> Result<Outcome> {
        let sources = source::load_all(&self.root)?;
        let descriptors = sources.len();
        let resolver = Resolver::new(self.project.resolve.clone());
        let result = resolver.resolve(sources.into_iter().map(|source| {
            trace!(path = %source.path.display(), module = %source.descriptor.name, "registering");
            source.descriptor
        }));
        Ok(Outcome {
            descriptors,
            result,
        })
    }
}

// ---------------------------------------------------------------------------
// Failure report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct DiagnosticsReport<'a> {
    pub ok: bool,
    pub modules: usize,
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: &'a [Diagnostic],
}

impl<'a> DiagnosticsReport<'a> {
    pub fn new(ok: bool, modules: usize, diagnostics: &'a [Diagnostic]) -> Self {
        let errors = diagnostics.iter().filter(|d| d.is_fatal()).count();
        Self {
            ok,
            modules,
            errors,
            warnings: diagnostics.len() - errors,
            diagnostics,
        }
    }

    pub fn render(&self, mode: OutputMode) -> Result<()> {
        render_mode(
            mode,
            self,
            |report, w| {
                writeln!(
                    w,
                    "{} modules, {} errors, {} warnings",
                    report.modules, report.errors, report.warnings
                )?;
                write_diagnostics_text(w, report.diagnostics)
            },
            |report, w| {
                pretty_section(w, if report.ok { "Resolution ok" } else { "Resolution failed" })?;
                pretty_kv(w, "Modules", report.modules.to_string())?;
                pretty_kv(w, "Errors", report.errors.to_string())?;
                pretty_kv(w, "Warnings", report.warnings.to_string())?;
                write_diagnostics_pretty(w, report.diagnostics)
            },
        )
    }
}

/// Print every diagnostic of a failed pass and turn it into the command's
/// error.
pub fn fail_resolution(
    diagnostics: &DiagnosticList,
    modules: usize,
    mode: OutputMode,
) -> anyhow::Error {
    let report = DiagnosticsReport::new(false, modules, diagnostics.as_slice());
    if let Err(err) = report.render(mode) {
        return err;
    }
    anyhow!(
        "resolution failed: {} error(s), {} warning(s)",
        report.errors,
        report.warnings
    )
}
