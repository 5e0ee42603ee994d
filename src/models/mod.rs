//! Persisted records and the stores behind them.

pub mod prediction;
pub mod user;

pub use prediction::*;
pub use user::*;
