// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors raised while parsing builder configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Unknown SQL dialect: {name}")]
    UnknownDialect { name: String },

    #[error("Invalid sort direction '{value}', expected 'asc' or 'desc'")]
    InvalidDirection { value: String },
}
