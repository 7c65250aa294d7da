#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use marga_core::config::resolve_config;
use marga_core::error::ErrorCode;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "marga: progress and schedule health for road-construction contracts",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (unless `MARGA_LOG` is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Workspace",
        about = "Initialize a marga workspace",
        long_about = "Create .marga/ with a config template and an empty project store.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    mg init\n\n    # Rewrite the config template\n    mg init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Records",
        about = "Create, list, show, or delete projects",
        after_help = "EXAMPLES:\n    # Register a contract\n    mg project create --name \"Jalan Melati\" --start 2024-01-01 --end 2024-06-30\n\n    # List projects with schedule health\n    mg project list --json"
    )]
    Project(cmd::project::ProjectArgs),

    #[command(
        next_help_heading = "Records",
        about = "Maintain a project's bill of quantities",
        after_help = "EXAMPLES:\n    # Add a BoQ line\n    mg boq add prj-abc --item-number 3.1 --unit m3 --quantity 120 --unit-price 450000\n\n    # Show completion per line\n    mg boq list prj-abc"
    )]
    Boq(cmd::boq::BoqArgs),

    #[command(
        next_help_heading = "Records",
        about = "Submit, list, or delete weekly reports",
        after_help = "EXAMPLES:\n    # Submit week 3\n    mg report submit prj-abc --week 3 --start 2024-01-15 --end 2024-01-21 --item boq-1=12.5\n\n    # Weekly and cumulative progress\n    mg report list prj-abc"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one project's schedule health",
        after_help = "EXAMPLES:\n    mg status prj-abc\n    mg status prj-abc --json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Read",
        about = "Planned S-curve against actual progress",
        after_help = "EXAMPLES:\n    # Weekly samples\n    mg curve prj-abc\n\n    # Fortnightly samples as JSON\n    mg curve prj-abc --tick-days 14 --json"
    )]
    Curve(cmd::curve::CurveArgs),

    #[command(
        next_help_heading = "Read",
        about = "Portfolio roll-up across every project",
        after_help = "EXAMPLES:\n    mg dashboard\n    mg dashboard --behind"
    )]
    Dashboard(cmd::dashboard::DashboardArgs),

    #[command(
        next_help_heading = "Workspace",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    mg completions bash > ~/.local/share/bash-completion/completions/mg"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("MARGA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "marga=debug,info"
        } else {
            "marga=info,warn"
        })
    });

    let format = env::var("MARGA_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

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

/// Locate the workspace above `cwd` and load its config.
fn open_workspace(cwd: &Path, json: bool) -> anyhow::Result<cmd::Workspace> {
    let root = cmd::find_workspace_root(cwd)?;
    let config = resolve_config(&root, json)
        .map_err(|err| CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}")))?
        .project;
    debug!(root = %root.display(), policy = %config.reports.over_quota, "workspace resolved");
    Ok(cmd::Workspace { root, config })
}

fn run(cli: &Cli, output: OutputMode, cwd: &Path) -> anyhow::Result<()> {
    let workspace = || open_workspace(cwd, cli.json);

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, cwd),
        Commands::Project(args) => cmd::project::run_project(args, output, &workspace()?),
        Commands::Boq(args) => cmd::boq::run_boq(args, output, &workspace()?),
        Commands::Report(args) => cmd::report::run_report(args, output, &workspace()?),
        Commands::Status(args) => cmd::status::run_status(args, output, &workspace()?),
        Commands::Curve(args) => cmd::curve::run_curve(args, output, &workspace()?),
        Commands::Dashboard(args) => cmd::dashboard::run_dashboard(args, output, &workspace()?),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command, &mut std::io::stdout())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let cwd = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("error: cannot read current directory: {err}");
            return ExitCode::FAILURE;
        }
    };

    // A malformed config is reported by the command itself; until then
    // fall back to plain text.
    let resolved = match resolve_config(&cwd, cli.json) {
        Ok(config) => config.resolved_output,
        Err(_) if cli.json => "json".to_string(),
        Err(_) => "text".to_string(),
    };
    let output = resolve_output_mode(cli.format, &resolved);

    match run(&cli, output, &cwd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "command failed");
            if let Err(render_err) = render_error(output, &CliError::from(&err)) {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::FAILURE
        }
    }
}
