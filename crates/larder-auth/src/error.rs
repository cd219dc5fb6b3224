//! Error types for authorization resolution.

use thiserror::Error;

/// Errors that can occur while resolving permissions.
///
/// Denied access is not an error: the resolver returns `Ok(None)` for
/// it. These variants are genuine failures the caller layer maps to
/// 5xx (or 404 for unknown resources), never to 403.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Storage error, including unknown resource ids.
    #[error("store error: {0}")]
    Store(#[from] larder_store::StoreError),
}

/// Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthError>;
