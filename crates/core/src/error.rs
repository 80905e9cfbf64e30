use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Authorization error: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Remote sync error: {0}")]
    Remote(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// Whether the error is a transient infrastructure failure worth retrying
    /// or reporting as upstream unavailability.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            Self::Remote(_) | Self::Io(_) => true,
            _ => false,
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Self::Unknown(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Self::Unknown(err.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
