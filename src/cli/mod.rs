//! CLI module - Command-line interface for plantcare
//!
//! Argument parsing uses clap derive; dispatch lives in `lib.rs`.

use clap::{Parser, Subcommand};

/// plantcare - plant watering tracker with push reminders
#[derive(Parser)]
#[command(name = "plantcare")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API together with the reminder scheduler
    #[command(alias = "daemon")]
    Serve,

    /// Run the due-plant reminder scan once and exit
    Check,

    /// Run the upcoming-waterings digest once and exit
    Digest,

    /// Create default config file
    Init,
}
