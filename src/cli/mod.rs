//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trailtrade")]
#[command(author, version, about = "Signal-driven trading with trailing stop management")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate the signal and trade it against the paper gateway
    Trade(TradeArgs),
    /// Evaluate the signal and print it without trading
    Signal(SignalArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct TradeArgs {
    /// Historical bar data (CSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Symbol to trade
    #[arg(short, long)]
    pub symbol: String,

    /// Timeframe
    #[arg(short, long, default_value = "1h")]
    pub timeframe: String,

    /// Order volume in lots
    #[arg(long, default_value = "0.1")]
    pub lot_size: Decimal,

    /// Stop-loss distance from the entry price
    #[arg(long)]
    pub stop_loss: Decimal,

    /// Take-profit distance from the entry price
    #[arg(long)]
    pub take_profit: Decimal,

    /// Trailing stop distance; omit to leave the stop fixed
    #[arg(long)]
    pub trailing: Option<Decimal>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,
}

#[derive(clap::Args)]
pub struct SignalArgs {
    /// Historical bar data (CSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Symbol the data belongs to
    #[arg(short, long)]
    pub symbol: String,

    /// Timeframe
    #[arg(short, long, default_value = "1h")]
    pub timeframe: String,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,
}
