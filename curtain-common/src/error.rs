//! Common error types for the curtain pipeline

use thiserror::Error;

/// Common result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the store, the pipeline and the HTTP surface
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error that is not worth retrying
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Referenced customer or order does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Required field missing, blank or malformed
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Store temporarily locked or contended
    #[error("Store busy: {0}")]
    TransientBusy(String),

    /// Role Gate refused the caller
    #[error("Denied: {0}")]
    Denied(String),
}

impl Error {
    /// True when repeating the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::TransientBusy(_))
    }
}

/// SQLite primary/extended result codes for SQLITE_BUSY and SQLITE_LOCKED
const BUSY_CODES: [&str; 6] = ["5", "6", "261", "262", "517", "773"];

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => Error::TransientBusy(err.to_string()),
            sqlx::Error::Database(db_err) => {
                let busy_code = db_err
                    .code()
                    .map(|code| BUSY_CODES.contains(&code.as_ref()))
                    .unwrap_or(false);
                let message = db_err.message();
                if busy_code
                    || message.contains("database is locked")
                    || message.contains("database table is locked")
                {
                    Error::TransientBusy(message.to_string())
                } else {
                    Error::Database(err)
                }
            }
            _ => Error::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_transient() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_row_not_found_is_not_transient() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::Database(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_display_includes_category() {
        let err = Error::ValidationFailed("shade is required".to_string());
        assert_eq!(err.to_string(), "Validation failed: shade is required");
    }
}
