//! Error types for the sharing engine.

use larder_auth::AuthError;
use larder_core::{Permission, ResourceRef, UserId};
use larder_store::StoreError;
use thiserror::Error;

/// Errors that can occur during engine operations.
///
/// Read-path denials are not here: the resolver reports "no access" as
/// a normal `None`. These variants cover failed mutations and system
/// faults, which the caller layer maps to HTTP statuses (`NotOwner` and
/// `AccessDenied` to 403, `ResourceNotFound` inside `Store` to 404).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage error, including unknown resource ids.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Authorization resolution error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// An owner-only operation was attempted by a non-owner.
    #[error("user {user} does not own {resource}")]
    NotOwner {
        /// The requesting user.
        user: UserId,
        /// The resource they do not own.
        resource: ResourceRef,
    },

    /// A mutation was attempted without sufficient permission.
    #[error("user {user} lacks {need} on {resource}")]
    AccessDenied {
        /// The requesting user.
        user: UserId,
        /// The resource involved.
        resource: ResourceRef,
        /// The permission the operation requires.
        need: Permission,
    },

    /// Share-code generation kept colliding past the retry budget.
    ///
    /// With 128-bit codes this indicates a broken RNG, not bad luck.
    #[error("could not generate a unique share code")]
    ShareCodeExhausted,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
