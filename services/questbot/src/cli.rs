//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "questbot",
    version,
    about = "Automates reward tasks, token pairs and lootboxes for game accounts"
)]
pub struct Cli {
    /// Config file (default: $CONFIG_PATH or ./questbot.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Complete every pending reward task on every account
    Tasks,
    /// Create tokens in pairs on a fixed cadence until interrupted
    Tokens,
    /// Open a lootbox on every account
    Lootbox {
        /// Lootbox id or name; prompts with the catalogue when omitted
        #[arg(long)]
        item: Option<String>,
        /// Keep opening until the balance runs out
        #[arg(long, conflicts_with = "once")]
        repeat: bool,
        /// Open exactly one per account
        #[arg(long)]
        once: bool,
    },
    /// Manage stored accounts
    Accounts {
        #[command(subcommand)]
        command: AccountsCommand,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Tasks => "tasks",
            Command::Tokens => "tokens",
            Command::Lootbox { .. } => "lootbox",
            Command::Accounts { .. } => "accounts",
        }
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum AccountsCommand {
    /// Show stored accounts
    List,
    /// Add an account and validate its cookie
    Add {
        #[arg(long)]
        label: Option<String>,
    },
    /// Validate every stored cookie
    Check,
}
