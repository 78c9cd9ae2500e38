//! Store error types and result alias.
//!
//! This module defines the error types that can occur during secret-store
//! operations. All store backends must map their internal errors to these
//! standardized error types.
//!
//! # Error Types
//!
//! - [`StoreError::NotFound`] - The named record does not exist in the store
//! - [`StoreError::Forbidden`] - The caller is not authorized for the record
//! - [`StoreError::Conflict`] - Update lost an optimistic-concurrency race
//! - [`StoreError::Connection`] - Network or connection-related failures
//! - [`StoreError::Timeout`] - Operation exceeded its time limit
//!
//! # Trace Context
//!
//! Each error variant carries an optional `span_id` captured from the active
//! [`tracing::Span`] at construction time. This enables end-to-end correlation
//! of errors with the request that produced them.
//!
//! # Example
//!
//! ```
//! use keygate_keystore::{StoreError, StoreResult};
//!
//! fn lookup(name: &str, namespace: &str) -> StoreResult<Vec<u8>> {
//!     Err(StoreError::not_found(name, namespace))
//! }
//! ```

use std::{fmt, sync::Arc};

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Captures the span ID from the current tracing span, if any.
fn current_span_id() -> Option<tracing::span::Id> {
    tracing::Span::current().id()
}

/// Errors that can occur during secret-store operations.
///
/// This enum represents the canonical set of errors that any store backend
/// can produce. Backend implementations should map their internal error types
/// to these variants.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The requested record was not found in the store.
    NotFound {
        /// Name of the record that was not found.
        name: String,
        /// Namespace the record was looked up in.
        namespace: String,
        /// Span ID captured at error creation for trace correlation.
        span_id: Option<tracing::span::Id>,
    },

    /// The caller is not authorized to read or write the record.
    Forbidden {
        /// Span ID captured at error creation for trace correlation.
        span_id: Option<tracing::span::Id>,
    },

    /// Update conflict due to optimistic locking failure.
    ///
    /// This error occurs when an update carries a stale record version
    /// because another writer committed first. The caller's next scheduled
    /// run re-reads the record and retries.
    Conflict {
        /// Span ID captured at error creation for trace correlation.
        span_id: Option<tracing::span::Id>,
    },

    /// Connection or network error.
    ///
    /// This error indicates a failure to communicate with the store backend,
    /// such as a network timeout, DNS failure, or connection refused.
    Connection {
        /// Description of the connection error.
        message: String,
        /// The underlying error that caused this connection failure.
        #[source]
        source: Option<BoxError>,
        /// Span ID captured at error creation for trace correlation.
        span_id: Option<tracing::span::Id>,
    },

    /// Operation timed out.
    Timeout {
        /// Span ID captured at error creation for trace correlation.
        span_id: Option<tracing::span::Id>,
    },
}

/// Appends ` [span=<id>]` to a formatter when a span ID is present.
fn fmt_span_suffix(f: &mut fmt::Formatter<'_>, span_id: &Option<tracing::span::Id>) -> fmt::Result {
    if let Some(id) = span_id { write!(f, " [span={}]", id.into_u64()) } else { Ok(()) }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { span_id, .. } => {
                write!(f, "Record not found")?;
                fmt_span_suffix(f, span_id)
            },
            Self::Forbidden { span_id } => {
                write!(f, "Access forbidden")?;
                fmt_span_suffix(f, span_id)
            },
            Self::Conflict { span_id } => {
                write!(f, "Update conflict")?;
                fmt_span_suffix(f, span_id)
            },
            Self::Connection { span_id, .. } => {
                write!(f, "Connection error")?;
                fmt_span_suffix(f, span_id)
            },
            Self::Timeout { span_id } => {
                write!(f, "Operation timeout")?;
                fmt_span_suffix(f, span_id)
            },
        }
    }
}

impl StoreError {
    /// Creates a new `NotFound` error for the given record.
    ///
    /// Captures the current tracing span ID for log correlation.
    #[must_use]
    pub fn not_found(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::NotFound {
            name: name.into(),
            namespace: namespace.into(),
            span_id: current_span_id(),
        }
    }

    /// Creates a new `Forbidden` error.
    ///
    /// Captures the current tracing span ID for log correlation.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::Forbidden { span_id: current_span_id() }
    }

    /// Creates a new `Conflict` error.
    ///
    /// Captures the current tracing span ID for log correlation.
    #[must_use]
    pub fn conflict() -> Self {
        Self::Conflict { span_id: current_span_id() }
    }

    /// Creates a new `Connection` error with the given message.
    ///
    /// Captures the current tracing span ID for log correlation.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None, span_id: current_span_id() }
    }

    /// Creates a new `Connection` error with a message and source error.
    ///
    /// Captures the current tracing span ID for log correlation.
    #[must_use]
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(Arc::new(source)),
            span_id: current_span_id(),
        }
    }

    /// Creates a new `Timeout` error.
    ///
    /// Captures the current tracing span ID for log correlation.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout { span_id: current_span_id() }
    }

    /// Returns the tracing span ID captured when this error was created,
    /// if a tracing subscriber was active at that time.
    #[must_use]
    pub fn span_id(&self) -> Option<&tracing::span::Id> {
        match self {
            Self::NotFound { span_id, .. }
            | Self::Forbidden { span_id, .. }
            | Self::Conflict { span_id, .. }
            | Self::Connection { span_id, .. }
            | Self::Timeout { span_id, .. } => span_id.as_ref(),
        }
    }

    /// Returns `true` if this error is transient and the operation may
    /// succeed on retry.
    ///
    /// Transient errors indicate the store backend is temporarily
    /// unavailable (network partition, timeout) but may recover.
    /// Non-transient errors (not found, forbidden, conflict) represent
    /// definitive responses that will not resolve by retrying the same
    /// operation unchanged.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }

    /// Returns a detailed diagnostic string for server-side logging.
    ///
    /// Unlike [`Display`], which produces generic messages safe for external
    /// consumers, this method includes internal details such as record names
    /// and connection error messages. **Never expose this output to external
    /// callers.**
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::NotFound { name, namespace, .. } => {
                format!("Record not found: {namespace}/{name}")
            },
            Self::Connection { message, .. } => {
                format!("Connection error: {message}")
            },
            // Variants with no additional private context — detail matches Display
            _ => self.to_string(),
        }
    }
}
