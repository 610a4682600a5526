//! Error handling for the introspection engine.
//!
//! Empty graphs and unknown entities are not errors: list operations return
//! empty results for them. Malformed stored settings are recovered where they
//! are read. Everything below propagates to the caller unchanged, without
//! retries.

use crate::gateway::GatewayError;
use crate::sparql::{QueryBuildError, RowError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Stable error codes, also used as process exit codes by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    /// Caller supplied identifier is not an absolute IRI
    InvalidIri = 2,
    /// A query template produced an invalid query
    QueryConstruction = 3,
    /// A result row did not have the expected shape
    RowMapping = 4,
    /// Query syntax or evaluation failure inside the store
    QueryFailed = 5,
    /// Store I/O or storage layer failure
    Storage = 6,
    /// Input document could not be parsed
    InvalidDocument = 7,
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Get the error category for logs
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::InvalidIri | ErrorCode::InvalidDocument => "client_error",
            ErrorCode::QueryConstruction | ErrorCode::RowMapping => "engine_bug",
            ErrorCode::QueryFailed => "query_error",
            ErrorCode::Storage => "io_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

// =============================================================================
// ENGINE ERROR
// =============================================================================

#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error("invalid IRI '{value}': {reason}")]
    InvalidIri { value: String, reason: String },

    #[error("failed to build query: {0}")]
    Query(#[from] QueryBuildError),

    #[error("unexpected result shape: {0}")]
    Row(#[from] RowError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl IntrospectError {
    pub fn invalid_iri(value: &str, reason: impl fmt::Display) -> Self {
        IntrospectError::InvalidIri {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            IntrospectError::InvalidIri { .. } => ErrorCode::InvalidIri,
            IntrospectError::Query(_) => ErrorCode::QueryConstruction,
            IntrospectError::Row(_) => ErrorCode::RowMapping,
            IntrospectError::Gateway(err) => match err {
                GatewayError::Syntax(_)
                | GatewayError::Evaluation(_)
                | GatewayError::UnexpectedResults { .. } => ErrorCode::QueryFailed,
                GatewayError::Storage(_) | GatewayError::Io(_) => ErrorCode::Storage,
                GatewayError::Parse(_)
                | GatewayError::UnsupportedSyntax(_)
                | GatewayError::NoSyntaxMatched(_) => ErrorCode::InvalidDocument,
            },
        }
    }
}

pub type Result<T, E = IntrospectError> = std::result::Result<T, E>;
