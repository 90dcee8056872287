//! `modplan show <MODULE>`: print one resolved module.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use modplan_core::ResolvedModule;
use serde::Serialize;

use super::{OutputFlags, Session, fail_resolution};
use crate::output::{pretty_kv, pretty_section, render_mode};

/// Arguments for `modplan show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Module name (case-sensitive).
    pub module: String,

    /// Directory to search for descriptor files (default: current directory).
    pub root: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ShowReport<'a> {
    #[serde(flatten)]
    module: &'a ResolvedModule,
    wave: Option<usize>,
}

/// Run `modplan show`.
///
/// # Errors
///
/// Returns an error if descriptors cannot be loaded, resolution fails, or
/// the module is not registered.
pub fn run_show(args: &ShowArgs, flags: OutputFlags) -> Result<()> {
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

    let module = resolution
        .module(&args.module)
        .with_context(|| format!("Cannot show '{}'", args.module))?;
    let report = ShowReport {
        module,
        wave: resolution.plan().wave_of(&module.name),
    };

    render_mode(
        session.mode,
        &report,
        |report, w| {
            let m = report.module;
            writeln!(w, "name {}", m.name)?;
            if let Some(wave) = report.wave {
                writeln!(w, "wave {wave}")?;
            }
            writeln!(w, "pch_usage {}", m.pch_usage)?;
            writeln!(w, "pch_eligible {}", m.pch_eligible)?;
            for dep in &m.public_closure {
                writeln!(w, "public_closure {dep}")?;
            }
            for path in &m.effective_include_paths {
                writeln!(w, "include {path}")?;
            }
            for name in &m.dynamically_loaded_modules {
                writeln!(w, "dynamic {name}")?;
            }
            Ok(())
        },
        |report, w| {
            let m = report.module;
            pretty_section(w, &m.name)?;
            if let Some(wave) = report.wave {
                pretty_kv(w, "Wave", wave.to_string())?;
            }
            pretty_kv(w, "PCH usage", m.pch_usage.as_str())?;
            pretty_kv(w, "Shared PCH", if m.pch_eligible { "yes" } else { "no" })?;
            pretty_kv(w, "Public deps", join_or_none(m.public_closure.iter()))?;
            pretty_kv(w, "Dynamic", join_or_none(m.dynamically_loaded_modules.iter()))?;
            writeln!(w)?;
            pretty_section(w, "Include paths")?;
            for path in &m.effective_include_paths {
                writeln!(w, "  {path}")?;
            }
            if !m.metadata.is_empty() {
                writeln!(w)?;
                pretty_section(w, "Metadata")?;
                for (key, value) in &m.metadata {
                    pretty_kv(w, key, value.to_string())?;
                }
            }
            Ok(())
        },
    )
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a String>) -> String {
    let joined = items.map(String::as_str).collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined
    }
}
