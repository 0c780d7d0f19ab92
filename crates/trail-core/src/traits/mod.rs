//! Traits for collaborators and indicators.

mod gateway;
mod indicator;
mod market_data;

pub use gateway::ExecutionGateway;
pub use indicator::{Indicator, MultiOutputIndicator};
pub use market_data::MarketData;
