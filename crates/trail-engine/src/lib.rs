//! Trade engine for the trailtrade system.
//!
//! [`TradeEngine`] runs the synchronous half of a trade request: fetch
//! history, compute the indicator snapshot, evaluate the signal, build and
//! submit the order. When trailing is requested, a [`controller`] task is
//! spawned per position to keep tightening the stop-loss until the position
//! closes, independent of the request that started it.

pub mod controller;
pub mod engine;
pub mod registry;

pub use controller::{ControllerStatus, TrailingParams};
pub use engine::{TradeEngine, TradeOutcome, TradeRequest};
pub use registry::TrailingRegistry;
