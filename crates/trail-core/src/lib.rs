//! Core types and traits for the trailtrade system.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, Quote)
//! - Order and position types (RiskParams, OrderIntent, Position)
//! - The error taxonomy shared across the workspace
//! - Traits for market data feeds, execution gateways, and indicators

pub mod error;
pub mod traits;
pub mod types;

pub use error::{TradeError, TradeResult};
pub use traits::*;
pub use types::*;
