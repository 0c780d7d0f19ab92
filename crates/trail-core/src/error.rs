//! Error types for the trailtrade system.

use thiserror::Error;

use crate::types::Ticket;

/// Top-level error returned from the trade engine.
#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid quote: {0}")]
    InvalidQuote(String),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Trailing controller already active for ticket {0}")]
    TrailingAlreadyActive(Ticket),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Indicator calculation errors.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Insufficient history: need {required} bars, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Market data feed errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Quote unavailable for {0}")]
    QuoteUnavailable(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Execution gateway errors.
///
/// The trailing stop controller retries transient errors on its next tick
/// and terminates only on fatal ones.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Stop-loss modification rejected: {0}")]
    ModifyRejected(String),

    #[error("Position not found: ticket {0}")]
    PositionNotFound(Ticket),

    #[error("Authentication expired")]
    AuthExpired,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Gateway call timed out")]
    Timeout,
}

impl GatewayError {
    /// Whether the error ends a trailing controller rather than being
    /// retried on the next tick.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::AuthExpired)
    }
}

/// Result type alias for trade operations.
pub type TradeResult<T> = Result<T, TradeError>;
