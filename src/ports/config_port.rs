//! Configuration access port.
//!
//! Numeric getters return the default when the key is absent and a
//! `ConfigInvalid` error when the value does not parse.

use crate::domain::error::ArbiterError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, ArbiterError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, ArbiterError>;
}
