//! Core data types for the trailtrade system.

mod ohlcv;
mod order;
mod position;
mod quote;
mod timeframe;

pub use ohlcv::{Bar, BarSeries};
pub use order::{Decision, OrderFill, OrderIntent, RiskParams, Side};
pub use position::{Position, Ticket};
pub use quote::Quote;
pub use timeframe::Timeframe;
