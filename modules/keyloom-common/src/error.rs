use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyloomError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Daily rate limit of {limit} reached")]
    DailyLimitExceeded { limit: usize },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
