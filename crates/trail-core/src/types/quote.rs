//! Real-time quote type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A bid/ask quote for a symbol.
///
/// Prices use Decimal so order and stop-loss arithmetic stays exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol
    pub symbol: String,
    /// Best bid price
    pub bid: Decimal,
    /// Best ask price
    pub ask: Decimal,
    /// Timestamp (Unix milliseconds)
    pub timestamp: i64,
}

impl Quote {
    /// Create a new quote.
    pub fn new(symbol: impl Into<String>, bid: Decimal, ask: Decimal, timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            bid,
            ask,
            timestamp,
        }
    }

    /// Get the mid price.
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    /// Get the spread.
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    /// A quote is usable for order construction when both sides are positive.
    pub fn is_valid(&self) -> bool {
        self.bid > Decimal::ZERO && self.ask > Decimal::ZERO
    }
}
