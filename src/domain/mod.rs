//! Core domain types and logic.

pub mod arbitration;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod ohlcv;
pub mod pipeline;
pub mod preprocessing;
pub mod recommendation;
pub mod series;
pub mod simulation;
pub mod summary;
