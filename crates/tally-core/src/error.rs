use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("range must be one of: 24h, 7d, 30d (got {0})")]
    UnknownRange(String),
}
