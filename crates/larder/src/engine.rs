//! The sharing engine: grant lifecycle, membership, and resource CRUD.
//!
//! The engine is the single entry point the HTTP layer talks to. It
//! enforces who may do what (owner-only grant management, permission
//! checks on mutations) and delegates persistence to an injected
//! [`Store`]. Authorization questions go through the resolver in
//! `larder-auth`; this module never re-implements an access check.

use std::sync::Arc;

use larder_auth::{generate_share_code, resolve};
use larder_core::{
    Binder, BinderId, Grant, GrantId, NewGrant, Permission, Recipe, RecipeId, ResourceRef,
    ShareCode, UserId,
};
use larder_store::{now_millis, Store};
use tracing::info;

use crate::error::{EngineError, Result};

/// Attempts at generating a unique share code before giving up.
const MAX_CODE_ATTEMPTS: u32 = 8;

/// The sharing engine.
///
/// Generic over the storage backend; correctness relies on the store's
/// transactional guarantees, not on in-process locking.
pub struct SharingEngine<S: Store> {
    store: Arc<S>,
}

impl<S: Store> SharingEngine<S> {
    /// Create an engine over a storage backend.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resource Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a recipe owned by `owner`.
    pub async fn create_recipe(&self, owner: UserId, title: &str, body: &str) -> Result<Recipe> {
        Ok(self.store.create_recipe(owner, title, body).await?)
    }

    /// Fetch a recipe, requiring at least `view` access.
    pub async fn read_recipe(
        &self,
        subject: UserId,
        id: RecipeId,
        presented_code: Option<&ShareCode>,
    ) -> Result<Recipe> {
        let effective = resolve(&*self.store, subject, id.into(), presented_code).await?;
        if effective.is_none() {
            return Err(EngineError::AccessDenied {
                user: subject,
                resource: id.into(),
                need: Permission::View,
            });
        }

        // Resolution already proved the recipe exists.
        Ok(self
            .store
            .get_recipe(id)
            .await?
            .ok_or_else(|| larder_store::StoreError::recipe_not_found(id))?)
    }

    /// Update a recipe's content. Requires `edit` via any path.
    pub async fn update_recipe(
        &self,
        actor: UserId,
        id: RecipeId,
        title: &str,
        body: &str,
        presented_code: Option<&ShareCode>,
    ) -> Result<()> {
        self.require(actor, id.into(), Permission::Edit, presented_code)
            .await?;
        Ok(self.store.update_recipe(id, title, body).await?)
    }

    /// Delete a recipe. Owner only; cascades to grants and memberships.
    pub async fn delete_recipe(&self, actor: UserId, id: RecipeId) -> Result<()> {
        self.require_owner(actor, id.into()).await?;
        Ok(self.store.delete_recipe(id).await?)
    }

    /// List recipes owned by a user.
    pub async fn list_recipes(&self, owner: UserId) -> Result<Vec<Recipe>> {
        Ok(self.store.list_recipes_for_owner(owner).await?)
    }

    /// Create a binder owned by `owner`.
    pub async fn create_binder(&self, owner: UserId, name: &str) -> Result<Binder> {
        Ok(self.store.create_binder(owner, name).await?)
    }

    /// Delete a binder. Owner only; member recipes are untouched.
    pub async fn delete_binder(&self, actor: UserId, id: BinderId) -> Result<()> {
        self.require_owner(actor, id.into()).await?;
        Ok(self.store.delete_binder(id).await?)
    }

    /// List binders owned by a user.
    pub async fn list_binders(&self, owner: UserId) -> Result<Vec<Binder>> {
        Ok(self.store.list_binders_for_owner(owner).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Grant Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Share a resource. Owner only.
    ///
    /// `shared_with = None` creates a link share redeemable by anyone
    /// holding the code; `Some(user)` targets a named user, whose grant
    /// still carries a code so either access mode works.
    pub async fn share(
        &self,
        owner: UserId,
        resource: ResourceRef,
        shared_with: Option<UserId>,
        permission: Permission,
    ) -> Result<Grant> {
        self.require_owner(owner, resource).await?;

        // Uniqueness is the store constraint's job; on a reported
        // collision we regenerate rather than pre-check, which races.
        for _ in 0..MAX_CODE_ATTEMPTS {
            let grant = NewGrant {
                resource_kind: resource.kind(),
                resource_id: resource.raw_id(),
                owner_id: owner,
                shared_with_id: shared_with,
                permission,
                share_code: generate_share_code(),
                created_at: now_millis(),
            };

            match self.store.insert_grant(grant).await {
                Ok(grant) => {
                    info!(
                        grant = %grant.id, resource = %resource, owner = %owner,
                        target = ?shared_with, permission = %permission,
                        "grant created"
                    );
                    return Ok(grant);
                }
                Err(larder_store::StoreError::ShareCodeCollision) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(EngineError::ShareCodeExhausted)
    }

    /// Revoke a grant. Owner only; idempotent.
    ///
    /// Revoking an unknown or already-inactive grant succeeds, so a
    /// retried revocation never errors. The row is kept as history.
    pub async fn revoke(&self, requester: UserId, grant_id: GrantId) -> Result<()> {
        let Some(grant) = self.store.get_grant(grant_id).await? else {
            return Ok(());
        };

        if grant.owner_id != requester {
            return Err(EngineError::NotOwner {
                user: requester,
                resource: grant_resource(&grant),
            });
        }

        self.store.deactivate_grant(grant_id).await?;
        info!(grant = %grant_id, owner = %requester, "grant revoked");
        Ok(())
    }

    /// All active grants for a resource, for a "manage shares" surface.
    /// Owner only.
    pub async fn list_shares(&self, requester: UserId, resource: ResourceRef) -> Result<Vec<Grant>> {
        self.require_owner(requester, resource).await?;
        Ok(self
            .store
            .find_active_grants(resource.kind(), resource.raw_id())
            .await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Membership Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a recipe to a binder the actor owns.
    ///
    /// If the actor owns the recipe, this is a plain membership insert
    /// and the returned id equals `recipe_id`. Otherwise the actor needs
    /// at least `view` access to the recipe, and the engine forks: the
    /// recipe's content is cloned into a new recipe owned by the actor,
    /// the clone is linked, and the clone's id is returned. Binders only
    /// ever contain recipes their owner actually owns.
    pub async fn add_recipe_to_binder(
        &self,
        actor: UserId,
        binder_id: BinderId,
        recipe_id: RecipeId,
        presented_code: Option<&ShareCode>,
    ) -> Result<RecipeId> {
        self.require_owner(actor, binder_id.into()).await?;

        let recipe = self
            .store
            .get_recipe(recipe_id)
            .await?
            .ok_or_else(|| larder_store::StoreError::recipe_not_found(recipe_id))?;

        if recipe.owner_id == actor {
            self.store.add_membership(binder_id, recipe_id).await?;
            return Ok(recipe_id);
        }

        self.require(actor, recipe_id.into(), Permission::View, presented_code)
            .await?;

        let clone = self
            .store
            .fork_recipe_into_binder(recipe_id, actor, binder_id)
            .await?;
        info!(
            source = %recipe_id, clone = %clone.id, binder = %binder_id, actor = %actor,
            "foreign recipe forked on add"
        );
        Ok(clone.id)
    }

    /// Remove a recipe from a binder the actor owns. No-op if absent.
    pub async fn remove_recipe_from_binder(
        &self,
        actor: UserId,
        binder_id: BinderId,
        recipe_id: RecipeId,
    ) -> Result<()> {
        self.require_owner(actor, binder_id.into()).await?;
        Ok(self.store.remove_membership(binder_id, recipe_id).await?)
    }

    /// Recipe ids contained in a binder.
    pub async fn binder_contents(&self, binder_id: BinderId) -> Result<Vec<RecipeId>> {
        Ok(self.store.list_recipes_for_binder(binder_id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// The effective permission of `subject` on a resource, or `None`
    /// for no access. This is the read-path entry point for the HTTP
    /// layer; `None` maps to 403, errors to 404/5xx.
    pub async fn check_access(
        &self,
        subject: UserId,
        resource: ResourceRef,
        presented_code: Option<&ShareCode>,
    ) -> Result<Option<Permission>> {
        Ok(resolve(&*self.store, subject, resource, presented_code).await?)
    }

    /// Fail with `AccessDenied` unless `actor` holds `need` on the resource.
    async fn require(
        &self,
        actor: UserId,
        resource: ResourceRef,
        need: Permission,
        presented_code: Option<&ShareCode>,
    ) -> Result<Permission> {
        let effective = resolve(&*self.store, actor, resource, presented_code).await?;
        match effective {
            Some(p) if p.satisfies(need) => Ok(p),
            _ => Err(EngineError::AccessDenied {
                user: actor,
                resource,
                need,
            }),
        }
    }

    /// Fail with `NotOwner` unless `actor` owns the resource.
    async fn require_owner(&self, actor: UserId, resource: ResourceRef) -> Result<()> {
        let owner = match resource {
            ResourceRef::Recipe(id) => {
                self.store
                    .get_recipe(id)
                    .await?
                    .ok_or_else(|| larder_store::StoreError::recipe_not_found(id))?
                    .owner_id
            }
            ResourceRef::Binder(id) => {
                self.store
                    .get_binder(id)
                    .await?
                    .ok_or_else(|| larder_store::StoreError::binder_not_found(id))?
                    .owner_id
            }
        };

        if owner != actor {
            return Err(EngineError::NotOwner {
                user: actor,
                resource,
            });
        }
        Ok(())
    }
}

fn grant_resource(grant: &Grant) -> ResourceRef {
    match grant.resource_kind {
        larder_core::ResourceKind::Recipe => ResourceRef::Recipe(RecipeId::new(grant.resource_id)),
        larder_core::ResourceKind::Binder => ResourceRef::Binder(BinderId::new(grant.resource_id)),
    }
}
