//! signalbar - status-bar signal cluster resolver
//!
//! Reads radio, VPN and layout events as JSON lines on stdin and writes one
//! resolved cluster state per pass as JSON on stdout.

mod events;
mod renderer;
mod services;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info, warn};

use signalbar_core::{Config, SignalCluster, logging};

use crate::renderer::JsonRenderer;
use crate::services::config_manager::ConfigManager;

/// signalbar - status-bar signal cluster resolver
#[derive(Parser, Debug)]
#[command(name = "signalbar", version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (uses XDG lookup if not specified)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print example configuration and exit
    #[arg(long)]
    print_example_config: bool,

    /// Validate configuration and exit (returns non-zero on errors)
    #[arg(long)]
    check_config: bool,

    /// Pretty-print each render state
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    logging::init(args.verbose);

    // --print-example-config: print the example config with comments
    if args.print_example_config {
        print!("{}", signalbar_core::DEFAULT_CONFIG_TOML);
        return ExitCode::SUCCESS;
    }

    // Load configuration using XDG lookup chain
    // If --config is specified, it must exist and be valid (no fallback)
    let load_result = match Config::find_and_load(args.config.as_deref()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref source) = load_result.source {
        info!("Loaded configuration from {:?}", source);
    } else if load_result.used_defaults {
        warn!("Using default configuration (no config file found)");
    }

    let config = load_result.config;

    // Validate configuration (strict - fail on invalid values)
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    for warning in config.warnings() {
        warn!("{}", warning);
    }
    debug!("Configuration validated successfully");

    // --check-config: just validate and exit
    if args.check_config {
        if let Some(ref source) = load_result.source {
            println!("Configuration valid: {}", source.display());
        } else {
            println!("Configuration valid (using defaults)");
        }
        println!("\n{}", config.summary());
        return ExitCode::SUCCESS;
    }

    match run(config, load_result.source, args.pretty) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Start the cluster, feed it stdin until EOF, then drain and stop.
fn run(config: Config, config_path: Option<PathBuf>, pretty: bool) -> anyhow::Result<()> {
    let manager = ConfigManager::new(config, config_path);
    let vpn = Arc::new(AtomicBool::new(false));

    let handle = SignalCluster::start(
        manager.cluster_config(),
        manager.settings_source(),
        vpn.clone(),
        JsonRenderer::new(io::stdout(), pretty),
    )
    .context("failed to start signal cluster")?;

    manager.start_watching(handle.clone());

    let stats = events::run_feed(io::stdin().lock(), &handle, &vpn);

    manager.stop_watching();
    handle.shutdown();

    let stats = stats?;
    info!(
        "Input closed: {} applied, {} rejected, {} malformed, {} passes rendered",
        stats.applied,
        stats.rejected,
        stats.malformed,
        handle.passes()
    );
    Ok(())
}
