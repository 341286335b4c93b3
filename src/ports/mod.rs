//! Port traits.

pub mod config_port;
pub mod data_port;
