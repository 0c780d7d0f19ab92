//! Market data feed trait.

use crate::error::DataError;
use crate::types::{Bar, Quote, Timeframe};
use async_trait::async_trait;

/// Trait for market data feeds.
///
/// Provides the price history the signal pipeline consumes and the live
/// quotes the order constructor and trailing controller read.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch the most recent `count` bars for a symbol.
    ///
    /// # Returns
    /// Bars ordered from oldest to newest.
    async fn recent_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError>;

    /// Get the latest bid/ask quote for a symbol.
    async fn latest_quote(&self, symbol: &str) -> Result<Quote, DataError>;

    /// Get the feed name.
    fn name(&self) -> &str;
}
