#![forbid(unsafe_code)]

mod cmd;
mod config;
mod output;
mod source;

use clap::{CommandFactory, Parser, Subcommand};
use cmd::OutputFlags;
use output::OutputMode;
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "modplan",
    author,
    version,
    about = "modplan: module dependency resolver and build-plan compiler",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (same as `--format json`).
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn output_flags(&self) -> OutputFlags {
        OutputFlags {
            format: self.format,
            json: self.json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Resolve",
        about = "Print the build plan",
        long_about = "Load every module descriptor under ROOT, resolve the dependency graph and print the build waves.",
        after_help = "EXAMPLES:\n    # Plan the current directory\n    modplan plan\n\n    # Plan another tree as JSON\n    modplan plan Source --json"
    )]
    Plan(cmd::plan::PlanArgs),

    #[command(
        next_help_heading = "Resolve",
        about = "Report resolution diagnostics",
        long_about = "Resolve every module descriptor under ROOT and print diagnostics only. Exits non-zero when the build plan would be withheld.",
        after_help = "EXAMPLES:\n    # Validate descriptors in CI\n    modplan check --format text"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        next_help_heading = "Resolve",
        about = "Show one resolved module",
        long_about = "Print a module's public closure, effective include paths, PCH eligibility and dynamic loads.",
        after_help = "EXAMPLES:\n    # Inspect a module\n    modplan show Engine\n\n    # Inspect a module in another tree\n    modplan show Engine Source --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    modplan completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("MODPLAN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "modplan=debug,info"
        } else {
            "modplan=info,warn"
        })
    });

    let format = env::var("MODPLAN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let flags = cli.output_flags();
    debug!(?flags, "starting");

    match cli.command {
        Commands::Plan(ref args) => cmd::plan::run_plan(args, flags),
        Commands::Check(ref args) => cmd::check::run_check(args, flags),
        Commands::Show(ref args) => cmd::show::run_show(args, flags),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command)
        }
    }
}
