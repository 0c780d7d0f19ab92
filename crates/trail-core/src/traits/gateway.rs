//! Execution gateway trait.

use crate::error::GatewayError;
use crate::types::{OrderFill, OrderIntent, Position, Ticket};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for execution venues.
///
/// The gateway owns order and position state. Callers submit immutable
/// order intents and adjust stop-losses through `modify_stop_loss`; they
/// never mutate positions directly.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Submit a market order.
    ///
    /// # Returns
    /// The fill with the venue-issued position ticket, or
    /// `GatewayError::OrderRejected` with the venue's reason.
    async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderFill, GatewayError>;

    /// Read the live state of a position.
    ///
    /// # Returns
    /// `None` once the position has closed (stopped out, target hit, or
    /// closed at the venue).
    async fn open_position(&self, ticket: Ticket) -> Result<Option<Position>, GatewayError>;

    /// Move a position's stop-loss to a new price.
    ///
    /// Venues may reject a modification transiently (requote, price moved);
    /// callers are expected to retry on a later tick.
    async fn modify_stop_loss(
        &self,
        ticket: Ticket,
        new_stop_loss: Decimal,
    ) -> Result<(), GatewayError>;

    /// Get the gateway name.
    fn name(&self) -> &str;
}
