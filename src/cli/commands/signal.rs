//! Signal command implementation.

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use trail_config::load_config;
use trail_core::traits::MarketData;
use trail_core::types::Timeframe;
use trail_data::CsvMarketData;
use trail_indicators::{latest_snapshot, MIN_HISTORY};

use crate::cli::SignalArgs;

pub async fn run(args: SignalArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

    let timeframe = Timeframe::from_str(&args.timeframe)?;
    let feed = Arc::new(
        CsvMarketData::load(&args.data, &args.symbol, config.engine.half_spread)
            .with_context(|| format!("Failed to load bar data from {:?}", args.data))?,
    );

    let count = config.engine.history_bars.max(MIN_HISTORY);
    let bars = feed.recent_bars(&args.symbol, timeframe, count).await?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let snapshot = latest_snapshot(&closes)?;
    let close = closes.last().copied().unwrap_or(f64::NAN);
    let decision = trail_signal::evaluate(close, &snapshot);

    match args.output.as_str() {
        "json" => {
            let out = json!({
                "symbol": args.symbol,
                "close": close,
                "decision": decision.to_string(),
                "indicators": snapshot,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => {
            println!("Symbol:   {}", args.symbol);
            println!("Close:    {:.5}", close);
            println!("RSI(14):  {:.2}", snapshot.rsi);
            println!("EMA(10):  {:.5}", snapshot.ema_10);
            println!("EMA(30):  {:.5}", snapshot.ema_30);
            println!("EMA(50):  {:.5}", snapshot.ema_50);
            println!("EMA(90):  {:.5}", snapshot.ema_90);
            println!("BB upper: {:.5}", snapshot.bb_upper);
            println!("BB lower: {:.5}", snapshot.bb_lower);
            println!("Signal:   {}", decision);
        }
    }

    Ok(())
}
