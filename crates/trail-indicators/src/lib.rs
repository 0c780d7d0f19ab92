//! Technical indicators for the trailtrade signal pipeline.
//!
//! Provides the indicator set the signal evaluator consumes:
//! - Moving averages (SMA, EMA)
//! - RSI with Wilder smoothing
//! - Bollinger Bands
//!
//! plus [`snapshot::latest_snapshot`], which annotates the final bar of a
//! price series with all of them at once.

pub mod momentum;
pub mod moving_average;
pub mod snapshot;
pub mod volatility;

pub use momentum::Rsi;
pub use moving_average::{Ema, Sma};
pub use snapshot::{latest_snapshot, snapshot_series, IndicatorSnapshot, MIN_HISTORY};
pub use volatility::{BollingerBands, BollingerOutput};
