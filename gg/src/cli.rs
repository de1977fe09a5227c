//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GlobeGuide - proactive travel-planning chat assistant
#[derive(Parser)]
#[command(
    name = "gg",
    about = "Proactive travel-planning chat assistant that remembers your preferences",
    version,
    after_help = "Logs are written to: ~/.local/share/globeguide/logs/globeguide.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, help = "Log level (trace, debug, info, warn, error)")]
    pub log_level: Option<String>,

    /// Print the preference map after every turn
    #[arg(short, long, global = true, help = "Print the preference map after every turn")]
    pub verbose: bool,

    /// Override the session state file location
    #[arg(long, global = true, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Override the known destinations file location
    #[arg(long, global = true, value_name = "PATH")]
    pub destinations: Option<PathBuf>,

    /// Subcommand to execute (defaults to `chat`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start an interactive chat (default)
    Chat,

    /// Print the remembered preferences and conversation size
    Show,

    /// Forget all remembered preferences and conversation history
    Reset,
}
