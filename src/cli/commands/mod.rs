//! CLI command implementations.

pub mod signal;
pub mod trade;
pub mod validate;
