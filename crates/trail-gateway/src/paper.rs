//! Paper execution gateway for simulation and tests.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use trail_core::error::GatewayError;
use trail_core::traits::ExecutionGateway;
use trail_core::types::{OrderFill, OrderIntent, Position, Quote, Side, Ticket};

struct Inner {
    next_ticket: Ticket,
    positions: HashMap<Ticket, Position>,
    /// Pending fault injections for tests and failure drills.
    reject_modifies: u32,
    reject_next_order: Option<String>,
    auth_expired: bool,
}

/// In-memory execution venue.
///
/// Fills market orders at the intent's entry price, tracks open positions
/// by ticket, and closes them when a pushed quote crosses their stop-loss
/// or take-profit. Drives the trailing controller in tests and paper runs.
pub struct PaperGateway {
    inner: Arc<Mutex<Inner>>,
}

impl PaperGateway {
    /// Create an empty paper gateway.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_ticket: 1,
                positions: HashMap::new(),
                reject_modifies: 0,
                reject_next_order: None,
                auth_expired: false,
            })),
        }
    }

    /// Push a quote into the venue, closing any position whose stop-loss or
    /// take-profit it crosses.
    ///
    /// # Returns
    /// Tickets of positions closed by this quote.
    pub fn set_quote(&self, quote: &Quote) -> Vec<Ticket> {
        let mut inner = self.inner.lock().unwrap();

        let closed: Vec<Ticket> = inner
            .positions
            .values()
            .filter(|p| p.symbol == quote.symbol && Self::is_closed_by(p, quote))
            .map(|p| p.ticket)
            .collect();

        for ticket in &closed {
            let position = inner.positions.remove(ticket);
            if let Some(position) = position {
                info!(
                    ticket,
                    symbol = %position.symbol,
                    stop_loss = %position.stop_loss,
                    "position closed by market"
                );
            }
        }

        closed
    }

    fn is_closed_by(position: &Position, quote: &Quote) -> bool {
        match position.side {
            // Longs exit on the bid
            Side::Buy => quote.bid <= position.stop_loss || quote.bid >= position.take_profit,
            // Shorts exit on the ask
            Side::Sell => quote.ask >= position.stop_loss || quote.ask <= position.take_profit,
        }
    }

    /// Close a position at the venue (manual close, delisting, etc.).
    pub fn close_position(&self, ticket: Ticket) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.positions.remove(&ticket).is_some()
    }

    /// Reject the next `count` stop-loss modifications with a requote.
    pub fn reject_modifies(&self, count: u32) {
        self.inner.lock().unwrap().reject_modifies = count;
    }

    /// Reject the next order submission with the given reason.
    pub fn reject_next_order(&self, reason: impl Into<String>) {
        self.inner.lock().unwrap().reject_next_order = Some(reason.into());
    }

    /// Invalidate the session: every later call fails with AuthExpired.
    pub fn expire_auth(&self) {
        self.inner.lock().unwrap().auth_expired = true;
    }

    /// Number of currently open positions.
    pub fn open_positions(&self) -> usize {
        self.inner.lock().unwrap().positions.len()
    }
}

impl Default for PaperGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionGateway for PaperGateway {
    async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderFill, GatewayError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.auth_expired {
            return Err(GatewayError::AuthExpired);
        }
        if let Some(reason) = inner.reject_next_order.take() {
            return Err(GatewayError::OrderRejected(reason));
        }

        let ticket = inner.next_ticket;
        inner.next_ticket += 1;

        let filled_price = intent.entry_price;
        let position = Position::from_intent(ticket, intent, filled_price);
        inner.positions.insert(ticket, position);

        info!(
            ticket,
            symbol = %intent.symbol,
            side = %intent.side,
            volume = %intent.volume,
            price = %filled_price,
            "order filled"
        );

        Ok(OrderFill {
            ticket,
            filled_price,
            filled_at: Utc::now().timestamp_millis(),
        })
    }

    async fn open_position(&self, ticket: Ticket) -> Result<Option<Position>, GatewayError> {
        let inner = self.inner.lock().unwrap();
        if inner.auth_expired {
            return Err(GatewayError::AuthExpired);
        }
        Ok(inner.positions.get(&ticket).cloned())
    }

    async fn modify_stop_loss(
        &self,
        ticket: Ticket,
        new_stop_loss: Decimal,
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.auth_expired {
            return Err(GatewayError::AuthExpired);
        }
        if inner.reject_modifies > 0 {
            inner.reject_modifies -= 1;
            return Err(GatewayError::ModifyRejected("requote".to_string()));
        }

        let position = inner
            .positions
            .get_mut(&ticket)
            .ok_or(GatewayError::PositionNotFound(ticket))?;

        debug!(ticket, from = %position.stop_loss, to = %new_stop_loss, "stop-loss modified");
        position.stop_loss = new_stop_loss;
        Ok(())
    }

    fn name(&self) -> &str {
        "Paper Gateway"
    }
}
