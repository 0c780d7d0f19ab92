//! CSV market data source.
//!
//! Loads a bar history from a CSV file and serves it through the
//! [`MarketData`] trait. A replay cursor marks the "current" bar:
//! `recent_bars` returns history up to the cursor and `latest_quote`
//! synthesizes a bid/ask around the cursor bar's close, so advancing the
//! cursor replays the file as a live feed.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::sync::Mutex;
use trail_core::error::DataError;
use trail_core::traits::MarketData;
use trail_core::types::{Bar, Quote, Timeframe};

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// CSV-backed market data feed.
#[derive(Debug)]
pub struct CsvMarketData {
    symbol: String,
    bars: Vec<Bar>,
    /// Index of the current bar for replay; starts at the last bar.
    cursor: Mutex<usize>,
    /// Distance from mid to each side of the synthetic quote.
    half_spread: Decimal,
}

impl CsvMarketData {
    /// Load bars for `symbol` from a CSV file.
    pub fn load(
        path: impl AsRef<Path>,
        symbol: impl Into<String>,
        half_spread: Decimal,
    ) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::DataUnavailable(format!(
                "no such file: {}",
                path.display()
            )));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let mut bars = Vec::new();
        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            let timestamp = parse_timestamp(&record.date)?;
            bars.push(Bar::new(
                timestamp,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume,
            ));
        }

        if bars.is_empty() {
            return Err(DataError::DataUnavailable(format!(
                "no bars in {}",
                path.display()
            )));
        }

        bars.sort_by_key(|b| b.timestamp);

        let cursor = Mutex::new(bars.len() - 1);
        Ok(Self {
            symbol: symbol.into(),
            bars,
            cursor,
            half_spread,
        })
    }

    /// Total number of loaded bars.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Whether any bars were loaded.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Position the replay cursor (clamped to the last bar).
    pub fn set_cursor(&self, index: usize) {
        let mut cursor = self.cursor.lock().unwrap();
        *cursor = index.min(self.bars.len() - 1);
    }

    /// Advance the cursor one bar.
    ///
    /// # Returns
    /// The new current bar, or `None` when the history is exhausted.
    pub fn advance(&self) -> Option<Bar> {
        let mut cursor = self.cursor.lock().unwrap();
        if *cursor + 1 >= self.bars.len() {
            return None;
        }
        *cursor += 1;
        Some(self.bars[*cursor])
    }

    fn current(&self) -> Bar {
        let cursor = self.cursor.lock().unwrap();
        self.bars[*cursor]
    }

    fn check_symbol(&self, symbol: &str) -> Result<(), DataError> {
        if symbol != self.symbol {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketData for CsvMarketData {
    async fn recent_bars(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        self.check_symbol(symbol)?;

        let end = *self.cursor.lock().unwrap() + 1;
        let start = end.saturating_sub(count);
        Ok(self.bars[start..end].to_vec())
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Quote, DataError> {
        self.check_symbol(symbol)?;

        let bar = self.current();
        let mid = Decimal::try_from(bar.close)
            .map_err(|_| DataError::QuoteUnavailable(symbol.to_string()))?;

        Ok(Quote::new(
            symbol,
            mid - self.half_spread,
            mid + self.half_spread,
            bar.timestamp,
        ))
    }

    fn name(&self) -> &str {
        "CSV"
    }
}

/// Parse various timestamp formats into Unix milliseconds.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    let formats = [
        "%Y-%m-%d",
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d-%m-%Y",
    ];

    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            let dt = d.and_hms_opt(0, 0, 0).unwrap();
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    // Try parsing as Unix timestamp; assume milliseconds if > 10 digits
    if let Ok(ts) = date_str.parse::<i64>() {
        if ts > 10_000_000_000 {
            return Ok(ts);
        } else {
            return Ok(ts * 1000);
        }
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    // 2024-01-15T10:00:00Z in epoch milliseconds
    const T0: i64 = 1_705_312_800_000;
    const HOUR: i64 = 3_600_000;

    fn write_csv(rows: &[(i64, f64)]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
        for (ts, close) in rows {
            writeln!(file, "{ts},{close},{close},{close},{close},100").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2024-01-15").is_ok());
        assert!(parse_timestamp("2024-01-15 10:30:00").is_ok());
        assert_eq!(parse_timestamp("1705312800000").unwrap(), 1705312800000);
        assert_eq!(parse_timestamp("1705312800").unwrap(), 1705312800000);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_load_and_fetch() {
        let file = write_csv(&[(T0 + 2 * HOUR, 1.2), (T0, 1.0), (T0 + HOUR, 1.1)]);
        let data = CsvMarketData::load(file.path(), "EURUSD", dec!(0.0001)).unwrap();

        assert_eq!(data.len(), 3);

        // Sorted by timestamp regardless of file order
        let bars = data.recent_bars("EURUSD", Timeframe::Hour1, 10).await.unwrap();
        assert_eq!(bars[0].timestamp, T0);
        assert_eq!(bars[2].timestamp, T0 + 2 * HOUR);
    }

    #[tokio::test]
    async fn test_replay_cursor() {
        let file = write_csv(&[(T0, 1.0), (T0 + HOUR, 1.1), (T0 + 2 * HOUR, 1.2)]);
        let data = CsvMarketData::load(file.path(), "EURUSD", dec!(0)).unwrap();

        data.set_cursor(0);
        let bars = data.recent_bars("EURUSD", Timeframe::Hour1, 10).await.unwrap();
        assert_eq!(bars.len(), 1);

        assert_eq!(data.advance().unwrap().timestamp, T0 + HOUR);
        assert_eq!(data.advance().unwrap().timestamp, T0 + 2 * HOUR);
        assert!(data.advance().is_none());

        let bars = data.recent_bars("EURUSD", Timeframe::Hour1, 2).await.unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].timestamp, T0 + 2 * HOUR);
    }

    #[tokio::test]
    async fn test_second_scale_timestamps_load_as_millis() {
        // 10-digit epochs are seconds and get scaled on load.
        let secs = T0 / 1000;
        let file = write_csv(&[(secs, 1.0), (secs + 3600, 1.1)]);
        let data = CsvMarketData::load(file.path(), "EURUSD", dec!(0)).unwrap();

        let bars = data.recent_bars("EURUSD", Timeframe::Hour1, 10).await.unwrap();
        assert_eq!(bars[0].timestamp, T0);
        assert_eq!(bars[1].timestamp, T0 + HOUR);
    }

    #[tokio::test]
    async fn test_synthetic_quote() {
        let file = write_csv(&[(1000, 1.1000)]);
        let data = CsvMarketData::load(file.path(), "EURUSD", dec!(0.0002)).unwrap();

        let quote = data.latest_quote("EURUSD").await.unwrap();
        assert_eq!(quote.bid, dec!(1.0998));
        assert_eq!(quote.ask, dec!(1.1002));
        assert!(quote.is_valid());
    }

    #[tokio::test]
    async fn test_unknown_symbol() {
        let file = write_csv(&[(1000, 1.0)]);
        let data = CsvMarketData::load(file.path(), "EURUSD", dec!(0)).unwrap();

        let err = data.latest_quote("GBPUSD").await.unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvMarketData::load("/nonexistent.csv", "EURUSD", dec!(0)).unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable(_)));
    }
}
