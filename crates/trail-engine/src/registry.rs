//! Per-ticket registry of trailing controllers.
//!
//! Enforces the one-controller-per-position rule and owns the lifecycle
//! handles (cancel channel, status channel, task join handle).

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use trail_config::TrailingSettings;
use trail_core::error::TradeError;
use trail_core::traits::{ExecutionGateway, MarketData};
use trail_core::types::Ticket;

use crate::controller::{ControllerStatus, TrailingController, TrailingParams};

struct TrailingHandle {
    cancel: watch::Sender<bool>,
    status: watch::Receiver<ControllerStatus>,
    task: Option<JoinHandle<()>>,
}

/// Tracks every trailing controller ever started, keyed by ticket.
///
/// Terminal entries are kept so their final status stays queryable; a new
/// controller for the same ticket replaces a terminal entry but is
/// rejected while a live one exists.
#[derive(Default)]
pub struct TrailingRegistry {
    inner: std::sync::Mutex<HashMap<Ticket, TrailingHandle>>,
}

impl TrailingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a controller for `params.ticket`.
    ///
    /// Fails with [`TradeError::TrailingAlreadyActive`] if a controller
    /// for the ticket is still running.
    pub fn start(
        &self,
        params: TrailingParams,
        market: Arc<dyn MarketData>,
        gateway: Arc<dyn ExecutionGateway>,
        settings: TrailingSettings,
    ) -> Result<(), TradeError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(existing) = inner.get(&params.ticket) {
            if !existing.status.borrow().is_terminal() {
                return Err(TradeError::TrailingAlreadyActive(params.ticket));
            }
        }

        let ticket = params.ticket;
        let symbol = params.symbol.clone();
        let (controller, cancel, status) =
            TrailingController::new(params, market, gateway, settings);
        let task = tokio::spawn(controller.run());

        info!(ticket, symbol = %symbol, "trailing controller started");
        inner.insert(
            ticket,
            TrailingHandle {
                cancel,
                status,
                task: Some(task),
            },
        );
        Ok(())
    }

    /// Latest status of the controller for `ticket`, if one was started.
    pub fn status(&self, ticket: Ticket) -> Option<ControllerStatus> {
        let inner = self.inner.lock().unwrap();
        inner.get(&ticket).map(|h| h.status.borrow().clone())
    }

    /// Cancel the controller for `ticket` and wait for it to stop.
    ///
    /// Once this returns, no further stop-loss modification will be
    /// issued for the ticket. A no-op for unknown or already-terminal
    /// tickets, so cancellation is idempotent.
    pub async fn cancel(&self, ticket: Ticket) {
        let task = {
            let mut inner = self.inner.lock().unwrap();
            let Some(handle) = inner.get_mut(&ticket) else {
                return;
            };
            let _ = handle.cancel.send(true);
            handle.task.take()
        };

        // Join outside the lock; the task ends promptly once it observes
        // the cancel flag.
        if let Some(task) = task {
            let _ = task.await;
            info!(ticket, "trailing controller cancelled");
        }
    }

    /// Cancel every live controller. Used during shutdown.
    pub async fn cancel_all(&self) {
        let tickets: Vec<Ticket> = {
            let inner = self.inner.lock().unwrap();
            inner.keys().copied().collect()
        };
        for ticket in tickets {
            self.cancel(ticket).await;
        }
    }
}
