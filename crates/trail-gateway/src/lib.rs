//! Simulated execution gateway.

mod paper;

pub use paper::PaperGateway;
