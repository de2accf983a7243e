use thiserror::Error;

/// Top-level error type used across the entire application.
///
/// The estimation engine itself never fails — degenerate inputs map to
/// defined default outputs — so this covers the boundary concerns only:
/// configuration and the host battery interface.
#[derive(Debug, Error)]
pub enum ChargeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("battery interface error: {0}")]
    Battery(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = ChargeError> = std::result::Result<T, E>;
