//! Order and decision types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Quote, Ticket};
use crate::error::TradeError;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Directional decision produced by the signal evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    /// The order side implied by the decision, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            Decision::Buy => Some(Side::Buy),
            Decision::Sell => Some(Side::Sell),
            Decision::Hold => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Buy => write!(f, "BUY"),
            Decision::Sell => write!(f, "SELL"),
            Decision::Hold => write!(f, "HOLD"),
        }
    }
}

/// Per-request risk parameters.
///
/// Distances are absolute price offsets, not percentages. A present
/// `trailing_distance` both requests trailing and carries the offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskParams {
    /// Volume to trade, in lots
    pub lot_size: Decimal,
    /// Take-profit offset from the entry price
    pub take_profit_distance: Decimal,
    /// Stop-loss offset from the entry price
    pub stop_loss_distance: Decimal,
    /// Trailing stop offset; None disables trailing
    pub trailing_distance: Option<Decimal>,
}

impl RiskParams {
    /// Validate that all quantities are positive.
    ///
    /// Called before any gateway interaction so bad inputs never reach the
    /// venue.
    pub fn validate(&self) -> Result<(), TradeError> {
        if self.lot_size <= Decimal::ZERO {
            return Err(TradeError::InvalidParameters(format!(
                "lot size must be positive, got {}",
                self.lot_size
            )));
        }
        if self.stop_loss_distance <= Decimal::ZERO {
            return Err(TradeError::InvalidParameters(format!(
                "stop-loss distance must be positive, got {}",
                self.stop_loss_distance
            )));
        }
        if self.take_profit_distance <= Decimal::ZERO {
            return Err(TradeError::InvalidParameters(format!(
                "take-profit distance must be positive, got {}",
                self.take_profit_distance
            )));
        }
        if let Some(trail) = self.trailing_distance {
            if trail <= Decimal::ZERO {
                return Err(TradeError::InvalidParameters(format!(
                    "trailing distance must be positive, got {}",
                    trail
                )));
            }
        }
        Ok(())
    }

    /// Whether a trailing stop controller should be started after the fill.
    pub fn trailing_requested(&self) -> bool {
        self.trailing_distance.is_some()
    }
}

/// A concrete order to submit to the execution gateway.
///
/// Built once per decision and never mutated; stop-loss adjustments go
/// through `ExecutionGateway::modify_stop_loss` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Symbol to trade
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Volume in lots
    pub volume: Decimal,
    /// Entry price (ask for buys, bid for sells)
    pub entry_price: Decimal,
    /// Initial stop-loss price
    pub stop_loss: Decimal,
    /// Take-profit price
    pub take_profit: Decimal,
}

impl OrderIntent {
    /// Build an order intent from a decision side, the current quote, and
    /// the request's risk parameters.
    ///
    /// Buys enter at the ask with the stop below and target above; sells
    /// mirror on the bid.
    pub fn build(
        symbol: impl Into<String>,
        side: Side,
        quote: &Quote,
        risk: &RiskParams,
    ) -> Result<Self, TradeError> {
        if !quote.is_valid() {
            return Err(TradeError::InvalidQuote(format!(
                "bid {} / ask {}",
                quote.bid, quote.ask
            )));
        }

        let (entry_price, stop_loss, take_profit) = match side {
            Side::Buy => (
                quote.ask,
                quote.ask - risk.stop_loss_distance,
                quote.ask + risk.take_profit_distance,
            ),
            Side::Sell => (
                quote.bid,
                quote.bid + risk.stop_loss_distance,
                quote.bid - risk.take_profit_distance,
            ),
        };

        Ok(Self {
            symbol: symbol.into(),
            side,
            volume: risk.lot_size,
            entry_price,
            stop_loss,
            take_profit,
        })
    }
}

/// Result of a successfully submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFill {
    /// Ticket identifying the resulting position at the venue
    pub ticket: Ticket,
    /// Price the order actually filled at
    pub filled_price: Decimal,
    /// Fill timestamp (Unix milliseconds)
    pub filled_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn risk() -> RiskParams {
        RiskParams {
            lot_size: dec!(0.1),
            take_profit_distance: dec!(5),
            stop_loss_distance: dec!(2),
            trailing_distance: None,
        }
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_decision_side() {
        assert_eq!(Decision::Buy.side(), Some(Side::Buy));
        assert_eq!(Decision::Sell.side(), Some(Side::Sell));
        assert_eq!(Decision::Hold.side(), None);
    }

    #[test]
    fn test_risk_params_validation() {
        assert!(risk().validate().is_ok());

        let mut bad = risk();
        bad.lot_size = Decimal::ZERO;
        assert!(bad.validate().is_err());

        let mut bad = risk();
        bad.stop_loss_distance = dec!(-1);
        assert!(bad.validate().is_err());

        let mut bad = risk();
        bad.trailing_distance = Some(Decimal::ZERO);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_buy_intent_prices() {
        let quote = Quote::new("EURUSD", dec!(99.5), dec!(100), 0);
        let intent = OrderIntent::build("EURUSD", Side::Buy, &quote, &risk()).unwrap();

        assert_eq!(intent.entry_price, dec!(100));
        assert_eq!(intent.stop_loss, dec!(98));
        assert_eq!(intent.take_profit, dec!(105));
        assert_eq!(intent.volume, dec!(0.1));
    }

    #[test]
    fn test_sell_intent_prices() {
        let quote = Quote::new("EURUSD", dec!(100), dec!(100.5), 0);
        let intent = OrderIntent::build("EURUSD", Side::Sell, &quote, &risk()).unwrap();

        assert_eq!(intent.entry_price, dec!(100));
        assert_eq!(intent.stop_loss, dec!(102));
        assert_eq!(intent.take_profit, dec!(95));
    }

    #[test]
    fn test_invalid_quote_rejected() {
        let quote = Quote::new("EURUSD", dec!(0), dec!(100), 0);
        let err = OrderIntent::build("EURUSD", Side::Buy, &quote, &risk()).unwrap_err();
        assert!(matches!(err, TradeError::InvalidQuote(_)));
    }
}
