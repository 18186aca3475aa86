//! # Error Taxonomy
//!
//! Conditions the pipeline distinguishes:
//!
//! - **NoSample**: no frame or classification this cycle (driver skips it)
//! - [`CatalogUnavailable`]: catalog search failed, curation yields nothing
//! - [`ExternalServiceError::Transient`]: worth retrying (timeouts, rate limits)
//! - [`ExternalServiceError::Permanent`]: auth/permission, never retried
//! - **NoTracksFound**: a warning on a successful sync, see
//!   [`crate::session::SyncWarning`]
//!
//! [`SyncError`] is what a failed sync cycle surfaces to the driver.

use thiserror::Error;

/// Failure reported by a playlist provider or identity capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalServiceError {
    #[error("transient service error: {0}")]
    Transient(String),
    #[error("permanent service error: {0}")]
    Permanent(String),
}

impl ExternalServiceError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ExternalServiceError::Transient(_))
    }
}

/// Catalog search failed; the caller gets no tracks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("catalog unavailable: {0}")]
pub struct CatalogUnavailable(pub String);

/// A sync cycle that could not bring the session to `Active`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("{operation} still failing after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: ExternalServiceError,
    },
    #[error("{operation} rejected: {source}")]
    Rejected {
        operation: &'static str,
        #[source]
        source: ExternalServiceError,
    },
}

impl SyncError {
    /// Permanent failures need outside intervention (e.g. re-auth) before
    /// syncing again.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, SyncError::Rejected { .. })
    }

    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            SyncError::RetriesExhausted { operation, .. }
            | SyncError::Rejected { operation, .. } => operation,
        }
    }
}
