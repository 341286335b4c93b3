//! Domain error types.

/// Top-level error type for signalarb.
///
/// Undefined indicator or decision values are never errors; they travel as
/// `None` through the series types.
#[derive(Debug, thiserror::Error)]
pub enum ArbiterError {
    #[error("cannot align {left} ({left_len} values) with {right} ({right_len} values)")]
    Length {
        left: String,
        right: String,
        left_len: usize,
        right_len: usize,
    },

    #[error("window {window} on {series} exceeds available history of {available} values")]
    Window {
        series: String,
        window: usize,
        available: usize,
    },

    #[error("invalid configuration for {parameter}: {reason}")]
    Configuration { parameter: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ArbiterError {
    pub fn configuration(parameter: &str, reason: impl Into<String>) -> Self {
        ArbiterError::Configuration {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the failures that only abort a single indicator method.
    pub fn is_method_local(&self) -> bool {
        matches!(self, ArbiterError::Length { .. } | ArbiterError::Window { .. })
    }
}

impl From<&ArbiterError> for std::process::ExitCode {
    fn from(err: &ArbiterError) -> Self {
        let code: u8 = match err {
            ArbiterError::Io(_) => 1,
            ArbiterError::Configuration { .. }
            | ArbiterError::ConfigParse { .. }
            | ArbiterError::ConfigMissing { .. }
            | ArbiterError::ConfigInvalid { .. } => 2,
            ArbiterError::Data { .. } | ArbiterError::NoData { .. } => 3,
            ArbiterError::Length { .. } | ArbiterError::Window { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
