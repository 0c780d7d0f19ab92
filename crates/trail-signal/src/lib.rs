//! Signal evaluation for the trailtrade system.
//!
//! Turns an indicator snapshot plus the latest close into a BUY/SELL/HOLD
//! decision. Order construction lives on
//! [`trail_core::types::OrderIntent::build`].

mod evaluator;

pub use evaluator::{evaluate, RSI_OVERBOUGHT, RSI_OVERSOLD};
