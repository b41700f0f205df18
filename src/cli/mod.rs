//! Command-line interface definitions.
//!
//! Every command except `run` is a one-shot operator action: it loads the
//! registry, applies one change and shuts the registry down, which writes
//! everything back to the configured store.

pub mod check;
pub mod faction;
pub mod output;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::domain::FactionKind;

/// Faction registry and persistence engine for role-play servers.
#[derive(Parser, Debug)]
#[command(name = "factionkeep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (defaults apply if it does not exist)
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Color output mode [auto, always, never]
    #[arg(long, global = true, default_value = "auto", hide_possible_values = true)]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the registry and keep flushing changes until Ctrl-C
    Run(RunArgs),

    /// List every faction
    List,

    /// Show one faction with its ranks
    Show(FactionArg),

    /// Create a faction
    Create(CreateArgs),

    /// Delete a faction and its stored record
    Delete(FactionArg),

    /// Add funds to a faction treasury
    Deposit(AmountArgs),

    /// Take funds from a faction treasury
    Withdraw(AmountArgs),

    /// Change the display name of a rank
    RenameRank(RenameRankArgs),

    /// Validate configuration and read every stored record
    Check,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,
}

/// Shared argument for commands that address one faction.
#[derive(Parser, Debug)]
pub struct FactionArg {
    /// Faction id (case-insensitive)
    pub id: String,
}

/// Arguments for the `create` subcommand.
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Faction id: lowercase letters, digits, '_' or '-'
    pub id: String,

    /// Display name
    pub name: String,

    /// Faction type [state, criminal, other]
    #[arg(long, default_value = "other")]
    pub kind: FactionKind,

    /// Hex color
    #[arg(long)]
    pub color: Option<String>,

    /// Chat prefix
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Starting treasury balance
    #[arg(long, default_value = "0")]
    pub balance: Decimal,

    /// Warehouse slot count (defaults to the configured size)
    #[arg(long)]
    pub warehouse_size: Option<usize>,
}

/// Arguments for `deposit` and `withdraw`.
#[derive(Parser, Debug)]
pub struct AmountArgs {
    /// Faction id
    pub id: String,

    /// Amount, e.g. 250 or 19.99
    pub amount: Decimal,
}

/// Arguments for the `rename-rank` subcommand.
#[derive(Parser, Debug)]
pub struct RenameRankArgs {
    /// Faction id
    pub id: String,

    /// Rank id
    pub rank: u32,

    /// New display name (omit with --reset)
    #[arg(required_unless_present = "reset")]
    pub name: Option<String>,

    /// Restore the rank's default name
    #[arg(long, conflicts_with = "name")]
    pub reset: bool,
}
