//! GlobeGuide - proactive travel-planning chat assistant
//!
//! CLI entry point.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use globeguide::cli::{Cli, Command};
use globeguide::config::{Config, debug_from_env};
use globeguide::memory::SessionStore;
use globeguide::preferences::preferences_to_text;
use globeguide::repl;

fn parse_level(level: &str) -> Option<tracing::Level> {
    match level.to_uppercase().as_str() {
        "TRACE" => Some(tracing::Level::TRACE),
        "DEBUG" => Some(tracing::Level::DEBUG),
        "INFO" => Some(tracing::Level::INFO),
        "WARN" | "WARNING" => Some(tracing::Level::WARN),
        "ERROR" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

fn setup_logging(cli_level: Option<&str>, config_level: Option<&str>, debug_env: bool) -> Result<()> {
    // Priority: CLI flag > config file > debug env var > INFO
    let level = cli_level
        .or(config_level)
        .and_then(parse_level)
        .unwrap_or(if debug_env { tracing::Level::DEBUG } else { tracing::Level::INFO });

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    if debug_env {
        // Debug runs log to stderr so they interleave with the chat
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        // Otherwise write to a log file, not stdout/stderr
        let log_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("globeguide")
            .join("logs");

        fs::create_dir_all(&log_dir).context("Failed to create log directory")?;
        let log_file = fs::File::create(log_dir.join("globeguide.log")).context("Failed to create log file")?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_ansi(false)
            .with_env_filter(filter)
            .init();
    }

    info!("Logging initialized (level: {}, debug env: {})", level, debug_env);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Peek at the config log level before logging is up
    let config_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_level.as_deref(), debug_from_env())
        .context("Failed to setup logging")?;

    // Load configuration and apply CLI overrides
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(state_file) = cli.state_file {
        config.storage.state_file = state_file;
    }
    if let Some(destinations) = cli.destinations {
        config.storage.destinations_file = destinations;
    }
    let verbose = cli.verbose || debug_from_env();

    info!(
        "GlobeGuide loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => repl::run_interactive(&config, verbose).await,
        Command::Show => cmd_show(&config),
        Command::Reset => cmd_reset(&config),
    }
}

/// Print the remembered preferences
fn cmd_show(config: &Config) -> Result<()> {
    debug!("cmd_show: called");
    let store = SessionStore::new(&config.storage.state_file);
    let state = store.load();

    println!("{}", "Remembered preferences".bold());
    if state.preferences.is_empty() {
        println!("  (none)");
    } else {
        for (key, value) in state.preferences.display_entries() {
            println!("  {}: {}", key.cyan(), value);
        }
    }
    println!();
    println!("{}", preferences_to_text(&state.preferences).dimmed());
    println!("Conversation turns: {}", state.history.len());
    println!("State file: {}", store.path().display());
    Ok(())
}

/// Forget everything
fn cmd_reset(config: &Config) -> Result<()> {
    debug!("cmd_reset: called");
    let store = SessionStore::new(&config.storage.state_file);
    store.reset().context("Failed to reset session state")?;
    println!("{} Preferences and conversation history cleared", "✓".green());
    Ok(())
}
