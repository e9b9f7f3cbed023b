//! # Routing Configuration Validator
//!
//! Command-line tool for validating routing configuration before starting a host process.
//! Loads the same layered sources as `ConfigManager` (files, environment overlay and
//! `ROUTING__*` variables), validates them and prints the effective configuration.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use routing_core::config::{ConfigManager, RouterConfig};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate routing configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment overlay to apply (development, test, production, ...)
    #[arg(short, long)]
    environment: Option<String>,

    /// Configuration directory path (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Single configuration file; overrides --config-dir
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate configuration and print a summary
    Validate,

    /// Print the effective configuration as JSON
    Show,

    /// Print the built-in defaults as JSON
    Defaults,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _ = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::Validate) | None => validate(&cli),
        Some(Commands::Show) => show(&cli),
        Some(Commands::Defaults) => print_json(&RouterConfig::default()),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {:#}", e);
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> Result<ConfigManager> {
    let manager = match (&cli.file, &cli.environment) {
        (Some(file), _) => {
            if !file.exists() {
                bail!("configuration file not found: {}", file.display());
            }
            ConfigManager::load_from_file(file)
                .with_context(|| format!("failed to load {}", file.display()))?
        }
        (None, Some(environment)) => {
            ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), environment)
                .context("failed to load configuration")?
        }
        (None, None) => ConfigManager::load_from_directory(cli.config_dir.clone())
            .context("failed to load configuration")?,
    };
    Ok(manager)
}

fn validate(cli: &Cli) -> Result<()> {
    let manager = load(cli)?;
    let config = manager.config();

    println!("🔧 Validating Routing Configuration");
    println!("Environment: {}", manager.environment());
    if let Some(dir) = manager.config_directory() {
        println!("Config Directory: {}", dir.display());
    }
    println!();

    println!("🔌 Circuit breaker");
    println!(
        "   ✅ failure threshold {} / open window {}ms",
        config.circuit_breaker.failure_threshold, config.circuit_breaker.timeout_ms
    );

    println!("💚 Health monitoring");
    println!(
        "   ✅ every {}ms, probe timeout {}ms, probe unknown on route: {}",
        config.health.check_interval_ms,
        config.health.probe_timeout_ms,
        config.health.probe_unknown_on_route
    );

    println!("📬 Queues");
    println!("   ✅ drain tick {}ms", config.queue.tick_interval_ms);

    println!("⏱️  Retry");
    println!(
        "   ✅ base {}ms, max {}ms, default budget {} attempt(s), default timeout {}ms",
        config.retry.base_delay_ms,
        config.retry.max_delay_ms,
        config.tasks.max_retries,
        config.tasks.timeout_ms
    );

    println!("🏁 Scoring");
    if config.scoring.priority_capable_services.is_empty() {
        println!("   ℹ️  no priority-capable services configured");
    } else {
        println!(
            "   ✅ priority-capable: {}",
            config.scoring.priority_capable_services.join(", ")
        );
    }

    println!("\n🎉 All configuration validation checks passed!");
    Ok(())
}

fn show(cli: &Cli) -> Result<()> {
    let manager = load(cli)?;
    print_json(manager.config())
}

fn print_json(config: &RouterConfig) -> Result<()> {
    let rendered = serde_json::to_string_pretty(config).context("failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}
