//! Error types for the store module.

use larder_core::ResourceKind;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A referenced resource id does not exist.
    #[error("{kind} not found: {id}")]
    ResourceNotFound {
        /// The kind of the missing resource.
        kind: ResourceKind,
        /// Its raw id.
        id: u64,
    },

    /// A freshly generated share code collided with an existing one.
    ///
    /// Internal: the caller regenerates and retries. Never surfaced to
    /// API consumers.
    #[error("share code collision")]
    ShareCodeCollision,

    /// Stored data did not parse (e.g. unknown permission string).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("store connection poisoned")]
    Poisoned,

    /// A blocking task failed to run to completion.
    #[error("blocking task failed: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Shorthand for a missing recipe.
    pub fn recipe_not_found(id: larder_core::RecipeId) -> Self {
        StoreError::ResourceNotFound {
            kind: ResourceKind::Recipe,
            id: id.as_u64(),
        }
    }

    /// Shorthand for a missing binder.
    pub fn binder_not_found(id: larder_core::BinderId) -> Self {
        StoreError::ResourceNotFound {
            kind: ResourceKind::Binder,
            id: id.as_u64(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
