//! Request validation and prediction-request bookkeeping.

pub mod prediction;
pub mod validation;

pub use prediction::*;
pub use validation::*;
