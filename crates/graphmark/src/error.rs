//! Error types for graphmark
//!
//! Errors are split by blast radius:
//!
//! | Variant | Scope |
//! |---------|-------|
//! | `Connection` | One backend's whole run |
//! | `Execution` | One query iteration |
//! | `Generation` / `Config` | Whole run, before any backend work |
//! | `Analysis` | One comparison, returned to the caller |

use thiserror::Error;

/// Top-level error type for graphmark operations
#[derive(Debug, Error)]
pub enum GraphmarkError {
    /// Backend unreachable or rejected credentials
    #[error("Connection to {backend} failed: {message}")]
    Connection { backend: String, message: String },

    /// A single statement failed on the backend
    #[error("Execution error: {message}")]
    Execution { message: String },

    /// Invalid scale configuration
    #[error("Invalid scale parameter '{field}': {message}")]
    Generation {
        field: &'static str,
        message: String,
    },

    /// Snapshot missing, malformed, or not comparable
    #[error("Analysis error: {message}")]
    Analysis { message: String },

    /// Invalid environment configuration
    #[error("Invalid configuration '{name}': {message}")]
    Config { name: &'static str, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphmarkError {
    /// Shorthand for an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Shorthand for a connection error against `backend`
    pub fn connection(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an analysis error
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }
}

/// Convenience type alias for graphmark results
pub type GraphmarkResult<T> = Result<T, GraphmarkError>;
