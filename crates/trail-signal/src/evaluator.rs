//! Decision rules.
//!
//! Buys deep oversold dips below the lower band while the short EMA still
//! leads the medium one; sells the mirrored overbought condition. First
//! match wins, in that order, else HOLD.

use tracing::debug;
use trail_core::types::Decision;
use trail_indicators::IndicatorSnapshot;

/// RSI at or below this level is considered deeply oversold.
pub const RSI_OVERSOLD: f64 = 16.0;
/// RSI at or above this level is considered deeply overbought.
pub const RSI_OVERBOUGHT: f64 = 85.0;

/// Evaluate the trading decision for the latest bar.
///
/// Pure function of the inputs: no hidden state, same decision for the same
/// snapshot every time. An incomplete snapshot (any non-finite value) or a
/// non-finite close forces HOLD.
///
/// The BUY leg is checked before the SELL leg; if both somehow matched, BUY
/// wins by evaluation order.
pub fn evaluate(close: f64, snapshot: &IndicatorSnapshot) -> Decision {
    if !close.is_finite() || !snapshot.is_complete() {
        debug!(close, "incomplete indicator snapshot, holding");
        return Decision::Hold;
    }

    let decision = if snapshot.rsi <= RSI_OVERSOLD
        && close < snapshot.bb_lower
        && snapshot.ema_10 > snapshot.ema_30
    {
        Decision::Buy
    } else if snapshot.rsi >= RSI_OVERBOUGHT
        && close > snapshot.bb_upper
        && snapshot.ema_10 < snapshot.ema_30
    {
        Decision::Sell
    } else {
        Decision::Hold
    };

    debug!(
        close,
        rsi = snapshot.rsi,
        bb_lower = snapshot.bb_lower,
        bb_upper = snapshot.bb_upper,
        ema_10 = snapshot.ema_10,
        ema_30 = snapshot.ema_30,
        %decision,
        "evaluated signal"
    );

    decision
}
