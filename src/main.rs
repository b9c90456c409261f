use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mutesting::config::RunConfig;
use mutesting::strategy::StrategyRegistry;
use mutesting::{output, run};

#[derive(Parser)]
#[command(name = "mutesting", version, about = "Mutation testing with isolated per-mutant project copies")]
struct Cli {
    /// JSON config file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Project root directory
    #[arg(long)]
    project_root: Option<PathBuf>,
    /// Directory mutant copies are written to
    #[arg(long)]
    output: Option<PathBuf>,
    /// Test command run inside each mutant copy (default: cargo test)
    #[arg(long)]
    test_cmd: Option<String>,
    /// Build command run before the tests, fatal on failure
    #[arg(long)]
    build_cmd: Option<String>,
    /// Cleanup command, always run after each mutant
    #[arg(long)]
    cleanup_cmd: Option<String>,
    /// Test command timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Replace existing mutant directories on name clash
    #[arg(long)]
    overwrite: bool,
    /// Do not mutate, only execute mutants already on disk
    #[arg(long)]
    no_mutate: bool,
    /// Do not execute tests, only generate mutants
    #[arg(long)]
    no_test: bool,
    /// Enable a mutation strategy (repeatable; default: all built-ins)
    #[arg(long = "strategy")]
    strategies: Vec<String>,
    /// List registered strategies and exit
    #[arg(long)]
    list_strategies: bool,
    /// Debug log output
    #[arg(short, long)]
    verbose: bool,
    /// Source files to mutate, relative to the project root
    files: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let registry = StrategyRegistry::with_builtins();
    if cli.list_strategies {
        for name in registry.names() {
            println!("{name}");
        }
        process::exit(0);
    }

    let config = match resolve_config(&cli, &registry) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            process::exit(1);
        }
    };

    match run::run(&config, &registry) {
        Ok(aggregator) => {
            if config.disable_test {
                tracing::info!("no mutation testing summary since tests were not executed");
            } else {
                output::print_report(&aggregator);
            }
            process::exit(0);
        }
        Err(e) => {
            output::print_error(&e.to_string());
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Merge the config file with command-line overrides; flags win.
fn resolve_config(cli: &Cli, registry: &StrategyRegistry) -> anyhow::Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RunConfig::default(),
    };

    if let Some(root) = &cli.project_root {
        config.project_root = root.clone();
    }
    if let Some(output) = &cli.output {
        config.mutant_dir = output.clone();
    }
    if let Some(cmd) = &cli.test_cmd {
        config.test_command = Some(cmd.clone());
    }
    if let Some(cmd) = &cli.build_cmd {
        config.build_command = Some(cmd.clone());
    }
    if let Some(cmd) = &cli.cleanup_cmd {
        config.cleanup_command = Some(cmd.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if cli.overwrite {
        config.overwrite = true;
    }
    if cli.no_mutate {
        config.disable_mutation = true;
    }
    if cli.no_test {
        config.disable_test = true;
    }
    if !cli.strategies.is_empty() {
        config.strategies = cli.strategies.clone();
    }
    if !cli.files.is_empty() {
        config.files = cli.files.clone();
    }
    if config.strategies.is_empty() {
        config.strategies = registry.names().iter().map(|s| s.to_string()).collect();
    }

    Ok(config)
}
