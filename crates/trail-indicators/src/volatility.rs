//! Volatility indicators.

use serde::{Deserialize, Serialize};
use trail_core::traits::MultiOutputIndicator;

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerOutput {
    /// Upper band
    pub upper: f64,
    /// Middle band (SMA)
    pub middle: f64,
    /// Lower band
    pub lower: f64,
}

/// Bollinger Bands.
///
/// A middle band (SMA of close) with upper and lower bands offset by a
/// multiple of the population standard deviation of the same window. The
/// signal pipeline uses a 6-bar window at 0.6 standard deviations.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    /// Create Bollinger Bands with the given window and deviation multiple.
    pub fn with_params(period: usize, std_dev_multiplier: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(
            std_dev_multiplier > 0.0,
            "Std dev multiplier must be positive"
        );
        Self {
            period,
            std_dev_multiplier,
        }
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<BollingerOutput> {
        if data.len() < self.period {
            return vec![];
        }

        let period_f64 = self.period as f64;
        let mut result = Vec::with_capacity(data.len() - self.period + 1);

        for window in data.windows(self.period) {
            let mean: f64 = window.iter().sum::<f64>() / period_f64;
            // Population standard deviation over the window
            let variance: f64 =
                window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period_f64;
            let offset = self.std_dev_multiplier * variance.sqrt();

            result.push(BollingerOutput {
                upper: mean + offset,
                middle: mean,
                lower: mean - offset,
            });
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "BollingerBands"
    }
}
