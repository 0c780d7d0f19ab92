//! Trade command implementation.
//!
//! Evaluates the signal at a point in the historical data, places the
//! resulting order against the paper gateway, and replays the remaining
//! bars so the trailing stop controller has live-looking quotes to work
//! against.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde_json::json;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use trail_config::load_config;
use trail_core::traits::{ExecutionGateway, MarketData};
use trail_core::types::{Decision, Quote, RiskParams, Ticket, Timeframe};
use trail_data::CsvMarketData;
use trail_engine::{ControllerStatus, TradeEngine, TradeRequest};
use trail_gateway::PaperGateway;
use trail_indicators::MIN_HISTORY;

use crate::cli::TradeArgs;

pub async fn run(args: TradeArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

    let timeframe = Timeframe::from_str(&args.timeframe)?;
    let risk = RiskParams {
        lot_size: args.lot_size,
        stop_loss_distance: args.stop_loss,
        take_profit_distance: args.take_profit,
        trailing_distance: args.trailing,
    };

    let feed = Arc::new(
        CsvMarketData::load(&args.data, &args.symbol, config.engine.half_spread)
            .with_context(|| format!("Failed to load bar data from {:?}", args.data))?,
    );
    let history = config.engine.history_bars.max(MIN_HISTORY);
    if feed.len() < history {
        anyhow::bail!(
            "Data file {:?} has {} bars, need at least {}",
            args.data,
            feed.len(),
            history
        );
    }

    // Evaluate at the earliest point with enough history, then replay the
    // rest of the file as the live feed.
    feed.set_cursor(history - 1);

    let gateway = Arc::new(PaperGateway::new());
    let engine = TradeEngine::new(
        Arc::clone(&feed) as Arc<dyn MarketData>,
        Arc::clone(&gateway) as Arc<dyn ExecutionGateway>,
        config.engine.clone(),
        config.trailing.clone(),
    );

    let request = TradeRequest {
        symbol: args.symbol.clone(),
        timeframe,
        risk,
    };
    let outcome = engine.evaluate_and_trade(&request).await?;

    if outcome.decision == Decision::Hold {
        info!(symbol = %args.symbol, "no signal, nothing to do");
        print_summary(&args, &outcome, None, None)?;
        return Ok(());
    }

    let ticket = outcome
        .fill
        .as_ref()
        .map(|f| f.ticket)
        .context("order filled without a ticket")?;

    let final_status = replay_remaining(
        &engine,
        &feed,
        &gateway,
        &args.symbol,
        config.engine.half_spread,
        config.trailing.poll_interval(),
        ticket,
    )
    .await;

    let final_stop = gateway
        .open_position(ticket)
        .await
        .ok()
        .flatten()
        .map(|p| p.stop_loss);
    print_summary(&args, &outcome, final_status.as_ref(), final_stop)?;
    Ok(())
}

/// Feed the rest of the file through the gateway tick by tick, then shut
/// the trailing controller down.
async fn replay_remaining(
    engine: &TradeEngine,
    feed: &CsvMarketData,
    gateway: &PaperGateway,
    symbol: &str,
    half_spread: Decimal,
    poll_interval: std::time::Duration,
    ticket: Ticket,
) -> Option<ControllerStatus> {
    while let Some(bar) = feed.advance() {
        let close = match Decimal::try_from(bar.close) {
            Ok(close) => close,
            Err(_) => continue,
        };
        let quote = Quote::new(symbol, close - half_spread, close + half_spread, bar.timestamp);
        let closed = gateway.set_quote(&quote);
        if closed.contains(&ticket) {
            info!(ticket, price = %close, "position closed during replay");
            break;
        }
        // Give the controller a tick between bars.
        tokio::time::sleep(poll_interval).await;

        if let Some(status) = engine.trailing_status(ticket) {
            if status.is_terminal() {
                break;
            }
        }
    }

    engine.cancel_trailing(ticket).await;
    engine.trailing_status(ticket)
}

fn print_summary(
    args: &TradeArgs,
    outcome: &trail_engine::TradeOutcome,
    trailing: Option<&ControllerStatus>,
    final_stop: Option<Decimal>,
) -> Result<()> {
    let summary = json!({
        "symbol": args.symbol,
        "decision": outcome.decision.to_string(),
        "order": outcome.intent.as_ref().map(|intent| json!({
            "side": intent.side.to_string(),
            "volume": intent.volume,
            "entry_price": intent.entry_price,
            "stop_loss": intent.stop_loss,
            "take_profit": intent.take_profit,
        })),
        "ticket": outcome.fill.as_ref().map(|f| f.ticket),
        "trailing_status": trailing.map(|s| s.to_string()),
        "final_stop_loss": final_stop,
    });

    match args.output.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => {
            println!("Symbol:   {}", args.symbol);
            println!("Decision: {}", outcome.decision);
            if let Some(intent) = &outcome.intent {
                println!("Entry:    {} @ {}", intent.side, intent.entry_price);
                println!("Stop:     {}", intent.stop_loss);
                println!("Target:   {}", intent.take_profit);
            }
            if let Some(status) = trailing {
                println!("Trailing: {}", status);
            }
            if let Some(stop) = final_stop {
                println!("Final SL: {}", stop);
            }
        }
    }
    Ok(())
}
