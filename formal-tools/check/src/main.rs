//! Formal Dispatch Checker Binary
//!
//! Run with: `formal-check [OPTIONS] <MANIFEST>`

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use formal::{ResolverConfig, TieBreak};
use formal_check::{check, Manifest};

#[derive(Parser)]
#[command(name = "formal-check")]
#[command(about = "Resolve the calls of a class manifest and report the selected methods")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Manifest to check
    #[arg(value_name = "MANIFEST")]
    manifest: Option<PathBuf>,

    /// Configuration file path (TOML)
    #[arg(short = 'c', long, env = "FORMAL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the tie-break policy
    #[arg(long, value_enum)]
    tie_break: Option<TieBreakArg>,

    /// Disable the dispatch cache
    #[arg(long)]
    no_cache: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum TieBreakArg {
    Error,
    FirstRegistered,
    Lexicographic,
}

impl From<TieBreakArg> for TieBreak {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::Error => TieBreak::Error,
            TieBreakArg::FirstRegistered => TieBreak::FirstRegistered,
            TieBreakArg::Lexicographic => TieBreak::Lexicographic,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    if let Some(Commands::Config) = &cli.command {
        println!("{}", serde_json::to_string_pretty(&ResolverConfig::default())?);
        return Ok(());
    }

    let Some(path) = &cli.manifest else {
        anyhow::bail!("no manifest given; run with --help for usage");
    };

    let config = build_config(&cli)?;
    debug!("Using configuration: {:?}", config);

    let manifest = Manifest::load(path)
        .with_context(|| format!("Failed to load manifest: {}", path.display()))?;
    let report = check(&manifest, config)
        .with_context(|| format!("Failed to apply manifest: {}", path.display()))?;

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text());
    }

    let failures = report.failures();
    if failures > 0 {
        info!("{} of {} call(s) did not resolve", failures, report.calls.len());
        std::process::exit(1);
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<ResolverConfig> {
    let mut config = if let Some(config_path) = &cli.config {
        ResolverConfig::load(config_path)
            .with_context(|| format!("Failed to load config file: {}", config_path.display()))?
    } else {
        ResolverConfig::default()
    };

    // Override with CLI options
    if let Some(tie_break) = cli.tie_break {
        config.tie_break = tie_break.into();
    }
    if cli.no_cache {
        config.cache = false;
    }

    Ok(config)
}
