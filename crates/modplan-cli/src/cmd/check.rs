//! `modplan check`: resolve and report diagnostics only.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::{DiagnosticsReport, OutputFlags, Session, fail_resolution};

/// Arguments for `modplan check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Directory to search for descriptor files (default: current directory).
    pub root: Option<PathBuf>,
}

/// Run `modplan check`.
///
/// Exits non-zero iff the pass would withhold the build plan.
///
/// # Errors
///
/// Returns an error if descriptors cannot be loaded or resolution fails.
pub fn run_check(args: &CheckArgs, flags: OutputFlags) -> Result<()> {
    let session = Session::open(args.root.as_deref(), flags)?;
    let outcome = session.resolve()?;

    match outcome.result {
        Ok(resolution) => {
            DiagnosticsReport::new(true, outcome.descriptors, resolution.warnings())
                .render(session.mode)
        }
        Err(diagnostics) => Err(fail_resolution(
            &diagnostics,
            outcome.descriptors,
            session.mode,
        )),
    }
}
