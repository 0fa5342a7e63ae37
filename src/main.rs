use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rgq::config::{get_config_path, AppConfig, SRCPATH_ENV};
use rgq::output;
use rgq::plan::{plan, CommandLine, Plan};
use rgq::query::parse_query;
use rgq::runner::Searcher;
use rgq::workspace::{suggest_repositories, walk_repositories};

const LOG_ENV: &str = "RGQ_LOG";

#[derive(Parser)]
#[command(name = "rgq")]
#[command(about = "Structured code search over ripgrep, scoped to repositories")]
#[command(override_usage = "rgq [OPTIONS] [RG FLAGS... --] QUERY...")]
#[command(arg_required_else_help = true)]
#[command(after_help = "ripgrep flags go before `--` and are passed through unchanged:\n  rgq -n --hidden -- foo f:src\nWithout `--`, every value is part of the query. Run `rg --help` for ripgrep's flags.")]
struct Cli {
    /// Print the search plan as JSON instead of running it
    #[arg(long)]
    explain: bool,

    /// List repositories whose name contains QUERY, best matches first
    #[arg(long, value_name = "QUERY")]
    repos: Option<String>,

    /// Stop after this many repository suggestions
    #[arg(long, value_name = "N", requires = "repos")]
    limit: Option<usize>,

    /// ripgrep executable
    #[arg(long, env = "RGQ_RG", value_name = "PATH")]
    rg_path: Option<PathBuf>,

    /// Print the configuration and workspace roots
    #[arg(long)]
    show_config: bool,

    /// ripgrep flags, `--`, then the query (without `--`, everything is query)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false);

    if let Err(e) = subscriber.try_init() {
        eprintln!("Failed to init tracing subscriber: {e}");
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("rgq: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load()?;
    if let Some(rg_path) = cli.rg_path {
        config.rg_path = rg_path;
    }

    if cli.show_config {
        show_config(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(query) = &cli.repos {
        let walk = walk_repositories(config.workspace_roots()?, config.walk_options());
        let suggestions = suggest_repositories(walk, query, cli.limit);
        output::print_suggestions(&suggestions)?;
        return Ok(exit_status(!suggestions.is_empty()));
    }

    let line = CommandLine::split(&cli.args);
    let predicate = parse_query(&line.query)?;
    debug!(%predicate, "parsed query");

    let roots = config.workspace_roots()?;
    let options = config.walk_options();
    let plan = plan(&predicate, &line.passthrough, || walk_repositories(roots, options))?;

    if cli.explain {
        output::print_json(&plan)?;
        return Ok(ExitCode::SUCCESS);
    }

    match plan {
        Plan::NoMatch => Ok(exit_status(false)),
        Plan::ListRepos { repos, .. } => {
            output::print_repo_paths(&repos)?;
            Ok(ExitCode::SUCCESS)
        }
        Plan::Search { args, roots, .. } => {
            let searcher = Searcher::new(&config.rg_path);
            let status = searcher.run_search(&args, &roots, config.batch_roots)?;
            Ok(ExitCode::from(status.exit_code()))
        }
    }
}

fn exit_status(matched: bool) -> ExitCode {
    if matched {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn show_config(config: &AppConfig) -> Result<()> {
    println!("Config file: {}", get_config_path()?.display());
    if std::env::var_os(SRCPATH_ENV).is_some() {
        println!("{} is set", SRCPATH_ENV);
    }
    println!("Workspace roots:");
    for root in config.workspace_roots()? {
        println!("  - {}", root.display());
    }
    println!("Repository markers: {}", config.repo_markers.join(", "));
    println!("ripgrep: {}", config.rg_path.display());
    println!("Batch roots: {}", config.batch_roots);
    Ok(())
}
