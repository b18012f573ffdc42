use thiserror::Error;

/// Errors raised while loading or validating hall configuration.
///
/// The per-frame simulation never returns errors; only the data it is
/// built from can be rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
