//! Trailing stop controller.
//!
//! One controller task owns one open position's stop-loss. On every tick it
//! reads the position and the current quote, computes the tightened
//! stop-loss candidate, and issues at most one modification. The stop only
//! ever moves in the trade's favor: up for longs, down for shorts.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use trail_config::TrailingSettings;
use trail_core::error::GatewayError;
use trail_core::traits::{ExecutionGateway, MarketData};
use trail_core::types::{Side, Ticket};

/// Observable lifecycle of a trailing stop controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerStatus {
    /// Actively polling and adjusting.
    Running,
    /// Position left the venue (stopped out, target hit, or manually
    /// closed). Terminal success.
    Closed,
    /// Caller withdrew the trailing request. Terminal.
    Cancelled,
    /// Non-retryable gateway error or too many consecutive transient
    /// failures. Terminal.
    Failed(String),
}

impl ControllerStatus {
    /// Whether the controller has stopped.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ControllerStatus::Running)
    }
}

impl std::fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerStatus::Running => write!(f, "running"),
            ControllerStatus::Closed => write!(f, "closed"),
            ControllerStatus::Cancelled => write!(f, "cancelled"),
            ControllerStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Immutable parameters captured when trailing starts.
#[derive(Debug, Clone)]
pub struct TrailingParams {
    pub symbol: String,
    pub ticket: Ticket,
    pub side: Side,
    /// Offset maintained between the favorable quote side and the stop.
    pub distance: Decimal,
    /// Stop-loss submitted with the original order.
    pub initial_stop_loss: Decimal,
}

/// Outcome of a single controller tick.
enum Tick {
    /// Position no longer open.
    Closed,
    /// Stop-loss moved to the new price.
    Adjusted(Decimal),
    /// Nothing to do this tick.
    Unchanged,
    /// Cancellation observed mid-tick, before the modify call.
    Cancelled,
}

enum TickError {
    Transient(String),
    Fatal(String),
}

/// The controller task. Created by [`crate::registry::TrailingRegistry`];
/// not used directly.
pub(crate) struct TrailingController {
    params: TrailingParams,
    /// Last stop-loss this controller successfully recorded.
    stop_loss: Decimal,
    market: Arc<dyn MarketData>,
    gateway: Arc<dyn ExecutionGateway>,
    settings: TrailingSettings,
    cancel: watch::Receiver<bool>,
    status: watch::Sender<ControllerStatus>,
}

impl TrailingController {
    pub(crate) fn new(
        params: TrailingParams,
        market: Arc<dyn MarketData>,
        gateway: Arc<dyn ExecutionGateway>,
        settings: TrailingSettings,
    ) -> (
        Self,
        watch::Sender<bool>,
        watch::Receiver<ControllerStatus>,
    ) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(ControllerStatus::Running);
        let stop_loss = params.initial_stop_loss;

        let controller = Self {
            params,
            stop_loss,
            market,
            gateway,
            settings,
            cancel: cancel_rx,
            status: status_tx,
        };
        (controller, cancel_tx, status_rx)
    }

    /// Drive the controller until a terminal state.
    ///
    /// Stop-loss modifications are strictly sequential: each tick awaits
    /// its gateway call before the next tick can start, so a later
    /// modification can never overtake an earlier one.
    pub(crate) async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.settings.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut failures: u32 = 0;
        let outcome = loop {
            tokio::select! {
                changed = self.cancel.changed() => {
                    // A dropped sender counts as cancellation too.
                    if changed.is_err() || *self.cancel.borrow() {
                        break ControllerStatus::Cancelled;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            match self.tick().await {
                Ok(Tick::Closed) => break ControllerStatus::Closed,
                Ok(Tick::Cancelled) => break ControllerStatus::Cancelled,
                Ok(Tick::Adjusted(stop_loss)) => {
                    failures = 0;
                    info!(
                        ticket = self.params.ticket,
                        symbol = %self.params.symbol,
                        stop_loss = %stop_loss,
                        "trailing stop tightened"
                    );
                }
                Ok(Tick::Unchanged) => failures = 0,
                Err(TickError::Fatal(reason)) => {
                    break ControllerStatus::Failed(reason);
                }
                Err(TickError::Transient(reason)) => {
                    failures += 1;
                    warn!(
                        ticket = self.params.ticket,
                        failures,
                        max = self.settings.max_consecutive_failures,
                        reason,
                        "transient trailing failure, retrying next tick"
                    );
                    if failures >= self.settings.max_consecutive_failures {
                        break ControllerStatus::Failed(format!(
                            "{failures} consecutive failures, last: {reason}"
                        ));
                    }
                }
            }
        };

        match &outcome {
            ControllerStatus::Failed(reason) => warn!(
                ticket = self.params.ticket,
                symbol = %self.params.symbol,
                reason,
                "trailing controller failed"
            ),
            status => info!(
                ticket = self.params.ticket,
                symbol = %self.params.symbol,
                %status,
                "trailing controller finished"
            ),
        }
        let _ = self.status.send(outcome);
    }

    /// One poll cycle: read position, read quote, tighten if possible.
    async fn tick(&mut self) -> Result<Tick, TickError> {
        let position = self
            .gateway
            .open_position(self.params.ticket)
            .await
            .map_err(classify)?;

        let Some(position) = position else {
            return Ok(Tick::Closed);
        };

        let quote = self
            .market
            .latest_quote(&self.params.symbol)
            .await
            .map_err(|e| TickError::Transient(e.to_string()))?;

        // max/min against both the venue's stop and the last one we set
        // keeps the stop moving only in the favorable direction, even if
        // the venue reports a stale value.
        let current = position.stop_loss;
        let candidate = match self.params.side {
            Side::Buy => current
                .max(self.stop_loss)
                .max(quote.ask - self.params.distance),
            Side::Sell => current
                .min(self.stop_loss)
                .min(quote.bid + self.params.distance),
        };

        if candidate == current {
            debug!(ticket = self.params.ticket, stop_loss = %current, "stop unchanged");
            return Ok(Tick::Unchanged);
        }

        // Cancellation must take effect before the next gateway call.
        if *self.cancel.borrow() {
            return Ok(Tick::Cancelled);
        }

        match self
            .gateway
            .modify_stop_loss(self.params.ticket, candidate)
            .await
        {
            Ok(()) => {
                self.stop_loss = candidate;
                Ok(Tick::Adjusted(candidate))
            }
            // Position closed between the read and the write.
            Err(GatewayError::PositionNotFound(_)) => Ok(Tick::Closed),
            Err(e) => Err(classify(e)),
        }
    }
}

fn classify(error: GatewayError) -> TickError {
    if error.is_fatal() {
        TickError::Fatal(error.to_string())
    } else {
        TickError::Transient(error.to_string())
    }
}
