// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the QoreFeed engine
//!
//! Store-specific errors are mapped to these variants so callers see one
//! error type whichever backend served the feed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use qore_query::QueryError;

/// Unified error type for all feed and store operations
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum EngineError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Query execution error: {message}")]
    ExecutionError { message: String },

    #[error("Driver not found: {driver_id}")]
    DriverNotFound { driver_id: String },

    #[error("Unable to find source in feed with tag: {tag}")]
    SourceNotFound { tag: String },

    #[error("Feed has no registered sources")]
    EmptyFeed,

    #[error("Record decode error: {message}")]
    Decode { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl EngineError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: msg.into() }
    }

    pub fn execution_error(msg: impl Into<String>) -> Self {
        Self::ExecutionError { message: msg.into() }
    }

    pub fn driver_not_found(id: impl Into<String>) -> Self {
        Self::DriverNotFound { driver_id: id.into() }
    }

    pub fn source_not_found(tag: impl Into<String>) -> Self {
        Self::SourceNotFound { tag: tag.into() }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode { message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { message: msg.into() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError { message: msg.into() }
    }
}

impl From<QueryError> for EngineError {
    fn from(err: QueryError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => Self::connection_failed(err.to_string()),
            _ => Self::execution_error(err.to_string()),
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_not_found_names_the_tag() {
        let err = EngineError::source_not_found("post");
        assert_eq!(err.to_string(), "Unable to find source in feed with tag: post");
    }

    #[test]
    fn query_errors_become_validation_errors() {
        let err: EngineError = QueryError::InvalidDirection {
            value: "up".into(),
        }
        .into();
        assert!(matches!(err, EngineError::ValidationError { .. }));
    }

    #[test]
    fn pool_errors_are_connection_failures() {
        let err: EngineError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, EngineError::ConnectionFailed { .. }));

        let err: EngineError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, EngineError::ExecutionError { .. }));
    }
}
