use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Malformed DNS message: {0}")]
    ParseError(String),

    #[error("Upstream query timeout")]
    UpstreamTimeout,

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cache snapshot error: {0}")]
    SnapshotError(String),
}
