//! `modplan plan`: resolve a descriptor root and print the build waves.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use modplan_core::{Diagnostic, Resolution};
use serde::Serialize;

use super::{OutputFlags, Session, fail_resolution};
use crate::output::{
    pretty_kv, pretty_rule, pretty_section, render_mode, write_diagnostics_pretty,
    write_diagnostics_text,
};

/// Arguments for `modplan plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Directory to search for descriptor files (default: current directory).
    pub root: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PlanReport<'a> {
    modules: usize,
    wave_count: usize,
    max_parallelism: usize,
    fingerprint: &'a str,
    content_hash: &'a str,
    waves: &'a [Vec<String>],
    warnings: &'a [Diagnostic],
}

impl<'a> PlanReport<'a> {
    fn new(resolution: &'a Resolution) -> Self {
        let plan = resolution.plan();
        Self {
            modules: plan.module_count(),
            wave_count: plan.wave_count(),
            max_parallelism: plan.max_parallelism(),
            fingerprint: plan.fingerprint(),
            content_hash: resolution.content_hash(),
            waves: plan.waves(),
            warnings: resolution.warnings(),
        }
    }
}

/// Run `modplan plan`.
///
/// # Errors
///
/// Returns an error if descriptors cannot be loaded or resolution reports a
/// fatal diagnostic.
pub fn run_plan(args: &PlanArgs, flags: OutputFlags) -> Result<()> {
    let session = Session::open(args.root.as_deref(), flags)?;
    let outcome = session.resolve()?;

    let resolution = match outcome.result {
        Ok(resolution) => resolution,
        Err(diagnostics) => {
            return Err(fail_resolution(
                &diagnostics,
                outcome.descriptors,
                session.mode,
            ));
        }
    };

    let report = PlanReport::new(&resolution);
    render_mode(
        session.mode,
        &report,
        |report, w| {
            for (i, wave) in report.waves.iter().enumerate() {
                writeln!(w, "wave {i}: {}", wave.join(" "))?;
            }
            write_diagnostics_text(w, report.warnings)
        },
        |report, w| {
            pretty_section(w, "Build plan")?;
            pretty_kv(w, "Modules", report.modules.to_string())?;
            pretty_kv(w, "Waves", report.wave_count.to_string())?;
            pretty_kv(w, "Parallelism", report.max_parallelism.to_string())?;
            pretty_kv(w, "Fingerprint", report.fingerprint)?;
            pretty_rule(w)?;
            for (i, wave) in report.waves.iter().enumerate() {
                writeln!(w, "Wave {i} ({})", wave.len())?;
                for module in wave {
                    writeln!(w, "  {module}")?;
                }
            }
            write_diagnostics_pretty(w, report.warnings)
        },
    )
}
