use thiserror::Error;

/// Failures that stop the application before or outside the event loop.
/// Query failures never end up here; they are shown inline instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("unknown reference timezone '{0}'")]
    UnknownTimezone(String),
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid parent key: {0}")]
    InvalidKey(#[from] hmac::digest::InvalidLength),
}
