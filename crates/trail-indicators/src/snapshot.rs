//! Indicator snapshot pipeline.
//!
//! Annotates the latest bar of a price series with the full indicator set
//! the signal evaluator consumes: RSI(14), EMA(10/30/50/90), and Bollinger
//! Bands(6, 0.6 sigma).

use serde::{Deserialize, Serialize};
use trail_core::error::IndicatorError;
use trail_core::traits::{Indicator, MultiOutputIndicator};
use trail_core::types::BarSeries;

use crate::{BollingerBands, Ema, Rsi};

/// Bars required before a snapshot is defined, set by the longest EMA.
pub const MIN_HISTORY: usize = 90;

const RSI_PERIOD: usize = 14;
const EMA_PERIODS: [usize; 4] = [10, 30, 50, 90];
const BB_PERIOD: usize = 6;
const BB_STD_DEV: f64 = 0.6;

/// Indicator values for a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub ema_10: f64,
    pub ema_30: f64,
    pub ema_50: f64,
    pub ema_90: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
}

impl IndicatorSnapshot {
    /// All values present and finite. The evaluator treats an incomplete
    /// snapshot as HOLD-ineligible.
    pub fn is_complete(&self) -> bool {
        [
            self.rsi,
            self.ema_10,
            self.ema_30,
            self.ema_50,
            self.ema_90,
            self.bb_upper,
            self.bb_lower,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Compute the snapshot for the final element of `closes`.
///
/// Deterministic and side-effect free: identical inputs produce identical
/// snapshots bit for bit.
///
/// # Errors
/// `IndicatorError::InsufficientHistory` when fewer than [`MIN_HISTORY`]
/// closes are available.
pub fn latest_snapshot(closes: &[f64]) -> Result<IndicatorSnapshot, IndicatorError> {
    if closes.len() < MIN_HISTORY {
        return Err(IndicatorError::InsufficientHistory {
            required: MIN_HISTORY,
            available: closes.len(),
        });
    }

    // With the history guard satisfied every calculation below is non-empty;
    // NaN fallbacks would fail the evaluator's completeness check anyway.
    let last = |values: Vec<f64>| values.last().copied().unwrap_or(f64::NAN);

    let rsi = last(Rsi::new(RSI_PERIOD).calculate(closes));
    let [ema_10, ema_30, ema_50, ema_90] =
        EMA_PERIODS.map(|period| last(Ema::new(period).calculate(closes)));

    let bands = BollingerBands::with_params(BB_PERIOD, BB_STD_DEV).calculate(closes);
    let (bb_upper, bb_lower) = bands
        .last()
        .map(|b| (b.upper, b.lower))
        .unwrap_or((f64::NAN, f64::NAN));

    Ok(IndicatorSnapshot {
        rsi,
        ema_10,
        ema_30,
        ema_50,
        ema_90,
        bb_upper,
        bb_lower,
    })
}

/// Snapshot the final bar of a series.
pub fn snapshot_series(series: &BarSeries) -> Result<IndicatorSnapshot, IndicatorError> {
    latest_snapshot(&series.closes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trail_core::types::{Bar, Timeframe};

    fn closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 4.0)
            .collect()
    }

    #[test]
    fn test_insufficient_history() {
        let err = latest_snapshot(&closes(89)).unwrap_err();
        match err {
            IndicatorError::InsufficientHistory {
                required,
                available,
            } => {
                assert_eq!(required, 90);
                assert_eq!(available, 89);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_snapshot_at_exact_minimum() {
        let snapshot = latest_snapshot(&closes(90)).unwrap();
        assert!(snapshot.is_complete());
        assert!(snapshot.rsi >= 0.0 && snapshot.rsi <= 100.0);
        assert!(snapshot.bb_upper >= snapshot.bb_lower);
    }

    #[test]
    fn test_snapshot_deterministic() {
        let data = closes(120);
        let a = latest_snapshot(&data).unwrap();
        let b = latest_snapshot(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_longer_emas_lag_in_uptrend() {
        let data: Vec<f64> = (0..120).map(|i| 100.0 + i as f64 * 0.5).collect();
        let snapshot = latest_snapshot(&data).unwrap();

        assert!(snapshot.ema_10 > snapshot.ema_30);
        assert!(snapshot.ema_30 > snapshot.ema_50);
        assert!(snapshot.ema_50 > snapshot.ema_90);
    }

    #[test]
    fn test_snapshot_series() {
        let mut series = BarSeries::new("EURUSD".to_string(), Timeframe::Hour1);
        for (i, close) in closes(100).into_iter().enumerate() {
            series.push(Bar::new(i as i64 * 3_600_000, close, close, close, close, 0.0));
        }

        let snapshot = snapshot_series(&series).unwrap();
        assert!(snapshot.is_complete());
    }
}
