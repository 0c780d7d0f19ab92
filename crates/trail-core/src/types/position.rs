//! Open position as reported by the execution gateway.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderIntent, Side};

/// Venue-issued identifier for an open position.
pub type Ticket = u64;

/// Snapshot of an open position.
///
/// The gateway owns position state; this system only reads it and writes a
/// modified stop-loss through `ExecutionGateway::modify_stop_loss`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Venue ticket
    pub ticket: Ticket,
    /// Symbol
    pub symbol: String,
    /// Direction of the position
    pub side: Side,
    /// Volume in lots
    pub volume: Decimal,
    /// Price the position was opened at
    pub entry_price: Decimal,
    /// Current stop-loss price
    pub stop_loss: Decimal,
    /// Current take-profit price
    pub take_profit: Decimal,
}

impl Position {
    /// Create a position from a filled order intent.
    pub fn from_intent(ticket: Ticket, intent: &OrderIntent, filled_price: Decimal) -> Self {
        Self {
            ticket,
            symbol: intent.symbol.clone(),
            side: intent.side,
            volume: intent.volume,
            entry_price: filled_price,
            stop_loss: intent.stop_loss,
            take_profit: intent.take_profit,
        }
    }
}
