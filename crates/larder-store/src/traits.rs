//! Store trait: the abstract interface for sharing-engine persistence.
//!
//! This trait keeps the resolver and lifecycle manager storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use larder_core::{
    Binder, BinderId, Grant, GrantId, NewGrant, Recipe, RecipeId, ResourceKind, ShareCode, UserId,
};

use crate::error::Result;

/// The Store trait: async interface for sharing-engine persistence.
///
/// All methods are async to support both sync (SQLite) and async
/// backends. For SQLite, blocking work runs under `spawn_blocking`.
///
/// # Design Notes
///
/// - **Soft delete for grants**: `deactivate_grant` flips `is_active`;
///   grant rows are never removed, preserving an audit trail.
/// - **Idempotent memberships**: adding an already-present pair is a
///   no-op, not an error.
/// - **Atomic compounds**: cascading deletes and `fork_recipe_into_binder`
///   are single methods so implementations can wrap them in one
///   transaction; a concurrent reader observes pre- or post-state only.
/// - **Share-code uniqueness**: enforced by a uniqueness constraint, not
///   by pre-checking (which races). A violation surfaces as
///   `StoreError::ShareCodeCollision` and the caller retries with a
///   fresh code.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Resource Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a recipe owned by `owner_id`.
    async fn create_recipe(&self, owner_id: UserId, title: &str, body: &str) -> Result<Recipe>;

    /// Get a recipe by id.
    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>>;

    /// Replace a recipe's content fields.
    ///
    /// Fails with `ResourceNotFound` if the recipe does not exist.
    async fn update_recipe(&self, id: RecipeId, title: &str, body: &str) -> Result<()>;

    /// Delete a recipe, deactivate its grants, and remove its
    /// memberships, atomically.
    ///
    /// Fails with `ResourceNotFound` if the recipe does not exist.
    async fn delete_recipe(&self, id: RecipeId) -> Result<()>;

    /// List recipes owned by a user.
    async fn list_recipes_for_owner(&self, owner_id: UserId) -> Result<Vec<Recipe>>;

    /// Create a binder owned by `owner_id`.
    async fn create_binder(&self, owner_id: UserId, name: &str) -> Result<Binder>;

    /// Get a binder by id.
    async fn get_binder(&self, id: BinderId) -> Result<Option<Binder>>;

    /// Delete a binder, deactivate its grants, and remove its membership
    /// rows, atomically. Member recipes themselves are untouched.
    ///
    /// Fails with `ResourceNotFound` if the binder does not exist.
    async fn delete_binder(&self, id: BinderId) -> Result<()>;

    /// List binders owned by a user.
    async fn list_binders_for_owner(&self, owner_id: UserId) -> Result<Vec<Binder>>;

    /// Clone a recipe's content into a new recipe owned by `new_owner`
    /// and add the clone to `binder_id`, atomically.
    ///
    /// Returns the clone. The source recipe is unmodified. Fails with
    /// `ResourceNotFound` if the source recipe or the binder is missing.
    async fn fork_recipe_into_binder(
        &self,
        recipe_id: RecipeId,
        new_owner: UserId,
        binder_id: BinderId,
    ) -> Result<Recipe>;

    // ─────────────────────────────────────────────────────────────────────────
    // Grant Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a new active grant.
    ///
    /// Fails with `ShareCodeCollision` if the grant's share code is
    /// already taken; the caller regenerates and retries.
    async fn insert_grant(&self, grant: NewGrant) -> Result<Grant>;

    /// Get a grant by id, active or not.
    async fn get_grant(&self, id: GrantId) -> Result<Option<Grant>>;

    /// All active grants for a resource, for audit/listing.
    async fn find_active_grants(&self, kind: ResourceKind, resource_id: u64) -> Result<Vec<Grant>>;

    /// The highest-permission active grant explicitly targeted at
    /// `subject` for a resource, if any.
    async fn find_active_grant_for_subject(
        &self,
        kind: ResourceKind,
        resource_id: u64,
        subject: UserId,
    ) -> Result<Option<Grant>>;

    /// Resolve a presented share code to its active grant, regardless of
    /// target subject.
    async fn find_active_grant_by_code(
        &self,
        kind: ResourceKind,
        code: &ShareCode,
    ) -> Result<Option<Grant>>;

    /// Set a grant inactive. No-op if the grant is already inactive or
    /// unknown (revocation is idempotent at this layer).
    async fn deactivate_grant(&self, id: GrantId) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Membership Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a recipe to a binder. Idempotent: adding an already-present
    /// pair is a no-op.
    ///
    /// Fails with `ResourceNotFound` if either row is missing.
    async fn add_membership(&self, binder_id: BinderId, recipe_id: RecipeId) -> Result<()>;

    /// Remove a recipe from a binder. No-op if not present.
    async fn remove_membership(&self, binder_id: BinderId, recipe_id: RecipeId) -> Result<()>;

    /// Recipe ids contained in a binder.
    async fn list_recipes_for_binder(&self, binder_id: BinderId) -> Result<Vec<RecipeId>>;

    /// Binder ids containing a recipe. Used by the resolver's
    /// inheritance path.
    async fn list_binders_for_recipe(&self, recipe_id: RecipeId) -> Result<Vec<BinderId>>;
}
