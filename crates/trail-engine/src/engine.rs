//! Trade engine: evaluate a symbol and act on the resulting signal.

use std::sync::Arc;
use tracing::{debug, info};

use trail_config::{EngineSettings, TrailingSettings};
use trail_core::error::TradeError;
use trail_core::traits::{ExecutionGateway, MarketData};
use trail_core::types::{Decision, OrderFill, OrderIntent, RiskParams, Ticket, Timeframe};
use trail_indicators::{latest_snapshot, MIN_HISTORY};

use crate::controller::{ControllerStatus, TrailingParams};
use crate::registry::TrailingRegistry;

/// One evaluation request: what to look at and how much to risk.
#[derive(Debug, Clone)]
pub struct TradeRequest {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub risk: RiskParams,
}

/// What an evaluation did. `intent` and `fill` are `None` on HOLD.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub decision: Decision,
    pub intent: Option<OrderIntent>,
    pub fill: Option<OrderFill>,
}

impl TradeOutcome {
    fn hold() -> Self {
        Self {
            decision: Decision::Hold,
            intent: None,
            fill: None,
        }
    }
}

/// Ties the signal pipeline to an execution gateway and the trailing
/// registry. One engine instance serves any number of requests.
pub struct TradeEngine {
    market: Arc<dyn MarketData>,
    gateway: Arc<dyn ExecutionGateway>,
    registry: TrailingRegistry,
    engine_settings: EngineSettings,
    trailing_settings: TrailingSettings,
}

impl TradeEngine {
    pub fn new(
        market: Arc<dyn MarketData>,
        gateway: Arc<dyn ExecutionGateway>,
        engine_settings: EngineSettings,
        trailing_settings: TrailingSettings,
    ) -> Self {
        Self {
            market,
            gateway,
            registry: TrailingRegistry::new(),
            engine_settings,
            trailing_settings,
        }
    }

    /// Fetch history, evaluate the signal, and on BUY/SELL submit a
    /// market order. When trailing was requested, a controller is
    /// started for the new position.
    pub async fn evaluate_and_trade(
        &self,
        request: &TradeRequest,
    ) -> Result<TradeOutcome, TradeError> {
        request.risk.validate()?;

        let count = self.engine_settings.history_bars.max(MIN_HISTORY);
        let bars = self
            .market
            .recent_bars(&request.symbol, request.timeframe, count)
            .await?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let snapshot = latest_snapshot(&closes)?;
        let close = closes.last().copied().unwrap_or(f64::NAN);
        let decision = trail_signal::evaluate(close, &snapshot);

        debug!(
            symbol = %request.symbol,
            %decision,
            rsi = snapshot.rsi,
            "signal evaluated"
        );

        let Some(side) = decision.side() else {
            return Ok(TradeOutcome::hold());
        };

        let quote = self.market.latest_quote(&request.symbol).await?;
        let intent = OrderIntent::build(&request.symbol, side, &quote, &request.risk)?;
        let fill = self.gateway.submit_order(&intent).await?;

        info!(
            symbol = %request.symbol,
            side = %side,
            ticket = fill.ticket,
            price = %fill.filled_price,
            "order filled"
        );

        if let Some(distance) = request.risk.trailing_distance {
            self.registry.start(
                TrailingParams {
                    symbol: request.symbol.clone(),
                    ticket: fill.ticket,
                    side,
                    distance,
                    initial_stop_loss: intent.stop_loss,
                },
                Arc::clone(&self.market),
                Arc::clone(&self.gateway),
                self.trailing_settings.clone(),
            )?;
        }

        Ok(TradeOutcome {
            decision,
            intent: Some(intent),
            fill: Some(fill),
        })
    }

    /// Stop trailing for `ticket`; returns once the controller has
    /// fully stopped.
    pub async fn cancel_trailing(&self, ticket: Ticket) {
        self.registry.cancel(ticket).await;
    }

    /// Cancel every live trailing controller.
    pub async fn shutdown(&self) {
        self.registry.cancel_all().await;
    }

    pub fn trailing_status(&self, ticket: Ticket) -> Option<ControllerStatus> {
        self.registry.status(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use std::time::Duration;
    use trail_core::error::{DataError, GatewayError};
    use trail_core::types::{Bar, Quote, Side};
    use trail_gateway::PaperGateway;

    /// Canned feed: fixed bar history plus a mutable current quote.
    struct ScriptedFeed {
        bars: Vec<Bar>,
        quote: Mutex<Quote>,
        fail_quotes: Mutex<u32>,
    }

    impl ScriptedFeed {
        fn new(closes: &[f64], bid: Decimal, ask: Decimal) -> Self {
            let bars = closes
                .iter()
                .enumerate()
                .map(|(i, &close)| Bar {
                    timestamp: (i as i64 + 1) * 60_000,
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1.0,
                })
                .collect();
            Self {
                bars,
                quote: Mutex::new(Quote::new("EURUSD", bid, ask, 0)),
                fail_quotes: Mutex::new(0),
            }
        }

        fn set_quote(&self, bid: Decimal, ask: Decimal) {
            let mut quote = self.quote.lock().unwrap();
            quote.bid = bid;
            quote.ask = ask;
        }

        fn fail_next_quotes(&self, count: u32) {
            *self.fail_quotes.lock().unwrap() = count;
        }
    }

    #[async_trait]
    impl MarketData for ScriptedFeed {
        async fn recent_bars(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            count: usize,
        ) -> Result<Vec<Bar>, DataError> {
            let start = self.bars.len().saturating_sub(count);
            Ok(self.bars[start..].to_vec())
        }

        async fn latest_quote(&self, _symbol: &str) -> Result<Quote, DataError> {
            let mut failures = self.fail_quotes.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(DataError::QuoteUnavailable("feed outage".into()));
            }
            Ok(self.quote.lock().unwrap().clone())
        }

        fn name(&self) -> &str {
            "Scripted Feed"
        }
    }

    /// 119 rising closes then a crash: RSI ~14.5, close below the lower
    /// band, EMA(10) above EMA(30). All three BUY legs fire.
    fn buy_trigger_closes() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..119).map(|i| 100.0 + 3.0 * i as f64).collect();
        closes.push(224.0);
        closes
    }

    /// Mirror image: long decline then a spike. All three SELL legs fire.
    fn sell_trigger_closes() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..119).map(|i| 800.0 - 3.0 * i as f64).collect();
        closes.push(676.0);
        closes
    }

    fn risk(trailing: Option<Decimal>) -> RiskParams {
        RiskParams {
            lot_size: dec!(0.1),
            take_profit_distance: dec!(50),
            stop_loss_distance: dec!(20),
            trailing_distance: trailing,
        }
    }

    fn request(trailing: Option<Decimal>) -> TradeRequest {
        TradeRequest {
            symbol: "EURUSD".into(),
            timeframe: Timeframe::Hour1,
            risk: risk(trailing),
        }
    }

    fn engine_settings() -> EngineSettings {
        EngineSettings {
            history_bars: 120,
            half_spread: dec!(0.5),
        }
    }

    fn trailing_settings() -> TrailingSettings {
        TrailingSettings {
            poll_interval_ms: 100,
            max_consecutive_failures: 3,
        }
    }

    fn engine(feed: Arc<ScriptedFeed>, gateway: Arc<PaperGateway>) -> TradeEngine {
        TradeEngine::new(feed, gateway, engine_settings(), trailing_settings())
    }

    async fn settle() {
        // With start_paused, advancing time runs due controller ticks.
        tokio::time::sleep(Duration::from_millis(350)).await;
    }

    #[tokio::test]
    async fn test_buy_signal_opens_position() {
        let feed = Arc::new(ScriptedFeed::new(&buy_trigger_closes(), dec!(224), dec!(225)));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(feed, Arc::clone(&gateway));

        let outcome = engine.evaluate_and_trade(&request(None)).await.unwrap();

        assert_eq!(outcome.decision, Decision::Buy);
        let intent = outcome.intent.unwrap();
        assert_eq!(intent.side, Side::Buy);
        assert_eq!(intent.entry_price, dec!(225));
        assert_eq!(intent.stop_loss, dec!(205));
        assert_eq!(intent.take_profit, dec!(275));
        assert!(outcome.fill.is_some());
        assert_eq!(gateway.open_positions(), 1);
    }

    #[tokio::test]
    async fn test_sell_signal_opens_position_at_bid() {
        let feed = Arc::new(ScriptedFeed::new(
            &sell_trigger_closes(),
            dec!(676),
            dec!(677),
        ));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(feed, Arc::clone(&gateway));

        let outcome = engine.evaluate_and_trade(&request(None)).await.unwrap();

        assert_eq!(outcome.decision, Decision::Sell);
        let intent = outcome.intent.unwrap();
        assert_eq!(intent.entry_price, dec!(676));
        assert_eq!(intent.stop_loss, dec!(696));
        assert_eq!(intent.take_profit, dec!(626));
    }

    #[tokio::test]
    async fn test_flat_market_holds() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + (i % 2) as f64 * 0.1).collect();
        let feed = Arc::new(ScriptedFeed::new(&closes, dec!(100), dec!(100.1)));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(feed, Arc::clone(&gateway));

        let outcome = engine.evaluate_and_trade(&request(None)).await.unwrap();

        assert_eq!(outcome.decision, Decision::Hold);
        assert!(outcome.intent.is_none());
        assert!(outcome.fill.is_none());
        assert_eq!(gateway.open_positions(), 0);
    }

    #[tokio::test]
    async fn test_short_history_is_insufficient() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let feed = Arc::new(ScriptedFeed::new(&closes, dec!(100), dec!(101)));
        let engine = engine(feed, Arc::new(PaperGateway::new()));

        let err = engine.evaluate_and_trade(&request(None)).await.unwrap_err();
        assert!(matches!(
            err,
            TradeError::Indicator(
                trail_core::error::IndicatorError::InsufficientHistory { .. }
            )
        ));
    }

    #[tokio::test]
    async fn test_invalid_risk_rejected_before_data_fetch() {
        let feed = Arc::new(ScriptedFeed::new(&buy_trigger_closes(), dec!(224), dec!(225)));
        let engine = engine(feed, Arc::new(PaperGateway::new()));

        let mut bad = request(None);
        bad.risk.lot_size = dec!(0);
        let err = engine.evaluate_and_trade(&bad).await.unwrap_err();
        assert!(matches!(err, TradeError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn test_rejected_order_surfaces_gateway_error() {
        let feed = Arc::new(ScriptedFeed::new(&buy_trigger_closes(), dec!(224), dec!(225)));
        let gateway = Arc::new(PaperGateway::new());
        gateway.reject_next_order("not enough margin");
        let engine = engine(feed, Arc::clone(&gateway));

        let err = engine.evaluate_and_trade(&request(None)).await.unwrap_err();
        assert!(matches!(
            err,
            TradeError::Gateway(GatewayError::OrderRejected(_))
        ));
        assert_eq!(gateway.open_positions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trailing_tightens_stop_as_price_rises() {
        let feed = Arc::new(ScriptedFeed::new(&buy_trigger_closes(), dec!(224), dec!(225)));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(Arc::clone(&feed), Arc::clone(&gateway));

        let outcome = engine
            .evaluate_and_trade(&request(Some(dec!(10))))
            .await
            .unwrap();
        let ticket = outcome.fill.unwrap().ticket;
        assert_eq!(engine.trailing_status(ticket), Some(ControllerStatus::Running));

        // Price rallies: stop follows at ask - 10.
        feed.set_quote(dec!(239), dec!(240));
        settle().await;
        let position = gateway.open_position(ticket).await.unwrap().unwrap();
        assert_eq!(position.stop_loss, dec!(230));

        // Price falls back: stop must not loosen.
        feed.set_quote(dec!(229), dec!(230));
        settle().await;
        let position = gateway.open_position(ticket).await.unwrap().unwrap();
        assert_eq!(position.stop_loss, dec!(230));

        engine.cancel_trailing(ticket).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_trailing_sell_stop_only_moves_down() {
        let feed = Arc::new(ScriptedFeed::new(
            &sell_trigger_closes(),
            dec!(676),
            dec!(677),
        ));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(Arc::clone(&feed), Arc::clone(&gateway));

        let outcome = engine
            .evaluate_and_trade(&request(Some(dec!(10))))
            .await
            .unwrap();
        let ticket = outcome.fill.unwrap().ticket;

        // Price drops: for a short the stop follows bid + 10 downward.
        feed.set_quote(dec!(660), dec!(661));
        settle().await;
        let position = gateway.open_position(ticket).await.unwrap().unwrap();
        assert_eq!(position.stop_loss, dec!(670));

        // Adverse bounce: stop holds.
        feed.set_quote(dec!(668), dec!(669));
        settle().await;
        let position = gateway.open_position(ticket).await.unwrap().unwrap();
        assert_eq!(position.stop_loss, dec!(670));

        engine.cancel_trailing(ticket).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller_observes_position_close() {
        let feed = Arc::new(ScriptedFeed::new(&buy_trigger_closes(), dec!(224), dec!(225)));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(Arc::clone(&feed), Arc::clone(&gateway));

        let outcome = engine
            .evaluate_and_trade(&request(Some(dec!(10))))
            .await
            .unwrap();
        let ticket = outcome.fill.unwrap().ticket;

        assert!(gateway.close_position(ticket));
        settle().await;
        assert_eq!(engine.trailing_status(ticket), Some(ControllerStatus::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_final() {
        let feed = Arc::new(ScriptedFeed::new(&buy_trigger_closes(), dec!(224), dec!(225)));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(Arc::clone(&feed), Arc::clone(&gateway));

        let outcome = engine
            .evaluate_and_trade(&request(Some(dec!(10))))
            .await
            .unwrap();
        let ticket = outcome.fill.unwrap().ticket;

        engine.cancel_trailing(ticket).await;
        assert_eq!(
            engine.trailing_status(ticket),
            Some(ControllerStatus::Cancelled)
        );
        let stop_before = gateway.open_position(ticket).await.unwrap().unwrap().stop_loss;

        // No modification after cancellation returns, even if price moves.
        feed.set_quote(dec!(300), dec!(301));
        settle().await;
        let stop_after = gateway.open_position(ticket).await.unwrap().unwrap().stop_loss;
        assert_eq!(stop_before, stop_after);

        // Second cancel is a no-op.
        engine.cancel_trailing(ticket).await;
        engine.cancel_trailing(9999).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_controller_rejected_while_running() {
        let feed = Arc::new(ScriptedFeed::new(&buy_trigger_closes(), dec!(224), dec!(225)));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(Arc::clone(&feed), Arc::clone(&gateway));

        let outcome = engine
            .evaluate_and_trade(&request(Some(dec!(10))))
            .await
            .unwrap();
        let ticket = outcome.fill.unwrap().ticket;

        let registry = &engine.registry;
        let err = registry
            .start(
                TrailingParams {
                    symbol: "EURUSD".into(),
                    ticket,
                    side: Side::Buy,
                    distance: dec!(10),
                    initial_stop_loss: dec!(205),
                },
                feed.clone(),
                gateway.clone(),
                trailing_settings(),
            )
            .unwrap_err();
        assert!(matches!(err, TradeError::TrailingAlreadyActive(t) if t == ticket));

        engine.cancel_trailing(ticket).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_expiry_fails_controller() {
        let feed = Arc::new(ScriptedFeed::new(&buy_trigger_closes(), dec!(224), dec!(225)));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(Arc::clone(&feed), Arc::clone(&gateway));

        let outcome = engine
            .evaluate_and_trade(&request(Some(dec!(10))))
            .await
            .unwrap();
        let ticket = outcome.fill.unwrap().ticket;

        gateway.expire_auth();
        settle().await;
        assert!(matches!(
            engine.trailing_status(ticket),
            Some(ControllerStatus::Failed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_retry_then_recover() {
        let feed = Arc::new(ScriptedFeed::new(&buy_trigger_closes(), dec!(224), dec!(225)));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(Arc::clone(&feed), Arc::clone(&gateway));

        let outcome = engine
            .evaluate_and_trade(&request(Some(dec!(10))))
            .await
            .unwrap();
        let ticket = outcome.fill.unwrap().ticket;

        // Two quote outages: under the limit of three, so still running.
        feed.fail_next_quotes(2);
        feed.set_quote(dec!(239), dec!(240));
        settle().await;
        assert_eq!(engine.trailing_status(ticket), Some(ControllerStatus::Running));

        // And it still catches up once the feed recovers.
        let position = gateway.open_position(ticket).await.unwrap().unwrap();
        assert_eq!(position.stop_loss, dec!(230));

        engine.cancel_trailing(ticket).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_limit_fails_controller() {
        let feed = Arc::new(ScriptedFeed::new(&buy_trigger_closes(), dec!(224), dec!(225)));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(Arc::clone(&feed), Arc::clone(&gateway));

        let outcome = engine
            .evaluate_and_trade(&request(Some(dec!(10))))
            .await
            .unwrap();
        let ticket = outcome.fill.unwrap().ticket;

        feed.fail_next_quotes(10);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(matches!(
            engine.trailing_status(ticket),
            Some(ControllerStatus::Failed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_modify_rejections_are_transient() {
        let feed = Arc::new(ScriptedFeed::new(&buy_trigger_closes(), dec!(224), dec!(225)));
        let gateway = Arc::new(PaperGateway::new());
        let engine = engine(Arc::clone(&feed), Arc::clone(&gateway));

        let outcome = engine
            .evaluate_and_trade(&request(Some(dec!(10))))
            .await
            .unwrap();
        let ticket = outcome.fill.unwrap().ticket;

        gateway.reject_modifies(2);
        feed.set_quote(dec!(239), dec!(240));
        settle().await;

        // Requotes exhausted, the adjustment eventually lands.
        assert_eq!(engine.trailing_status(ticket), Some(ControllerStatus::Running));
        let position = gateway.open_position(ticket).await.unwrap().unwrap();
        assert_eq!(position.stop_loss, dec!(230));

        engine.cancel_trailing(ticket).await;
    }
}
