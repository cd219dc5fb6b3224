//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use larder_core::{
    Binder, BinderId, Grant, GrantId, Membership, MembershipId, NewGrant, Recipe, RecipeId,
    ResourceKind, ShareCode, UserId,
};

use crate::error::{Result, StoreError};
use crate::now_millis;
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Recipes indexed by id.
    recipes: BTreeMap<RecipeId, Recipe>,

    /// Binders indexed by id.
    binders: BTreeMap<BinderId, Binder>,

    /// Grants indexed by id. Rows are never removed, only deactivated.
    grants: BTreeMap<GrantId, Grant>,

    /// Share-code uniqueness index: code -> grant id.
    codes: HashMap<String, GrantId>,

    /// Memberships indexed by id.
    memberships: BTreeMap<MembershipId, Membership>,

    next_recipe: u64,
    next_binder: u64,
    next_grant: u64,
    next_membership: u64,
}

impl MemoryStoreInner {
    fn next_recipe_id(&mut self) -> RecipeId {
        self.next_recipe += 1;
        RecipeId::new(self.next_recipe)
    }

    fn next_binder_id(&mut self) -> BinderId {
        self.next_binder += 1;
        BinderId::new(self.next_binder)
    }

    fn next_grant_id(&mut self) -> GrantId {
        self.next_grant += 1;
        GrantId::new(self.next_grant)
    }

    fn next_membership_id(&mut self) -> MembershipId {
        self.next_membership += 1;
        MembershipId::new(self.next_membership)
    }

    fn deactivate_grants_for(&mut self, kind: ResourceKind, resource_id: u64) {
        for grant in self.grants.values_mut() {
            if grant.resource_kind == kind && grant.resource_id == resource_id {
                grant.is_active = false;
            }
        }
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_recipe(&self, owner_id: UserId, title: &str, body: &str) -> Result<Recipe> {
        let mut inner = self.write()?;
        let recipe = Recipe {
            id: inner.next_recipe_id(),
            owner_id,
            title: title.to_string(),
            body: body.to_string(),
            created_at: now_millis(),
        };
        inner.recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>> {
        let inner = self.read()?;
        Ok(inner.recipes.get(&id).cloned())
    }

    async fn update_recipe(&self, id: RecipeId, title: &str, body: &str) -> Result<()> {
        let mut inner = self.write()?;
        let recipe = inner
            .recipes
            .get_mut(&id)
            .ok_or_else(|| StoreError::recipe_not_found(id))?;
        recipe.title = title.to_string();
        recipe.body = body.to_string();
        Ok(())
    }

    async fn delete_recipe(&self, id: RecipeId) -> Result<()> {
        let mut inner = self.write()?;
        if inner.recipes.remove(&id).is_none() {
            return Err(StoreError::recipe_not_found(id));
        }
        inner.deactivate_grants_for(ResourceKind::Recipe, id.as_u64());
        inner.memberships.retain(|_, m| m.recipe_id != id);
        Ok(())
    }

    async fn list_recipes_for_owner(&self, owner_id: UserId) -> Result<Vec<Recipe>> {
        let inner = self.read()?;
        Ok(inner
            .recipes
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create_binder(&self, owner_id: UserId, name: &str) -> Result<Binder> {
        let mut inner = self.write()?;
        let binder = Binder {
            id: inner.next_binder_id(),
            owner_id,
            name: name.to_string(),
            created_at: now_millis(),
        };
        inner.binders.insert(binder.id, binder.clone());
        Ok(binder)
    }

    async fn get_binder(&self, id: BinderId) -> Result<Option<Binder>> {
        let inner = self.read()?;
        Ok(inner.binders.get(&id).cloned())
    }

    async fn delete_binder(&self, id: BinderId) -> Result<()> {
        let mut inner = self.write()?;
        if inner.binders.remove(&id).is_none() {
            return Err(StoreError::binder_not_found(id));
        }
        inner.deactivate_grants_for(ResourceKind::Binder, id.as_u64());
        inner.memberships.retain(|_, m| m.binder_id != id);
        Ok(())
    }

    async fn list_binders_for_owner(&self, owner_id: UserId) -> Result<Vec<Binder>> {
        let inner = self.read()?;
        Ok(inner
            .binders
            .values()
            .filter(|b| b.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn fork_recipe_into_binder(
        &self,
        recipe_id: RecipeId,
        new_owner: UserId,
        binder_id: BinderId,
    ) -> Result<Recipe> {
        let mut inner = self.write()?;

        let source = inner
            .recipes
            .get(&recipe_id)
            .cloned()
            .ok_or_else(|| StoreError::recipe_not_found(recipe_id))?;
        if !inner.binders.contains_key(&binder_id) {
            return Err(StoreError::binder_not_found(binder_id));
        }

        let now = now_millis();
        let clone = Recipe {
            id: inner.next_recipe_id(),
            owner_id: new_owner,
            title: source.title,
            body: source.body,
            created_at: now,
        };
        inner.recipes.insert(clone.id, clone.clone());

        let membership = Membership {
            id: inner.next_membership_id(),
            binder_id,
            recipe_id: clone.id,
            added_at: now,
        };
        inner.memberships.insert(membership.id, membership);

        Ok(clone)
    }

    async fn insert_grant(&self, grant: NewGrant) -> Result<Grant> {
        let mut inner = self.write()?;

        if inner.codes.contains_key(grant.share_code.as_str()) {
            return Err(StoreError::ShareCodeCollision);
        }

        let stored = Grant {
            id: inner.next_grant_id(),
            resource_kind: grant.resource_kind,
            resource_id: grant.resource_id,
            owner_id: grant.owner_id,
            shared_with_id: grant.shared_with_id,
            permission: grant.permission,
            share_code: grant.share_code,
            is_active: true,
            created_at: grant.created_at,
        };
        inner
            .codes
            .insert(stored.share_code.as_str().to_string(), stored.id);
        inner.grants.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_grant(&self, id: GrantId) -> Result<Option<Grant>> {
        let inner = self.read()?;
        Ok(inner.grants.get(&id).cloned())
    }

    async fn find_active_grants(&self, kind: ResourceKind, resource_id: u64) -> Result<Vec<Grant>> {
        let inner = self.read()?;
        Ok(inner
            .grants
            .values()
            .filter(|g| g.is_active && g.resource_kind == kind && g.resource_id == resource_id)
            .cloned()
            .collect())
    }

    async fn find_active_grant_for_subject(
        &self,
        kind: ResourceKind,
        resource_id: u64,
        subject: UserId,
    ) -> Result<Option<Grant>> {
        let inner = self.read()?;
        Ok(inner
            .grants
            .values()
            .filter(|g| {
                g.is_active
                    && g.resource_kind == kind
                    && g.resource_id == resource_id
                    && g.shared_with_id == Some(subject)
            })
            .max_by_key(|g| g.permission)
            .cloned())
    }

    async fn find_active_grant_by_code(
        &self,
        kind: ResourceKind,
        code: &ShareCode,
    ) -> Result<Option<Grant>> {
        let inner = self.read()?;
        Ok(inner
            .codes
            .get(code.as_str())
            .and_then(|id| inner.grants.get(id))
            .filter(|g| g.is_active && g.resource_kind == kind)
            .cloned())
    }

    async fn deactivate_grant(&self, id: GrantId) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(grant) = inner.grants.get_mut(&id) {
            grant.is_active = false;
        }
        Ok(())
    }

    async fn add_membership(&self, binder_id: BinderId, recipe_id: RecipeId) -> Result<()> {
        let mut inner = self.write()?;

        if !inner.binders.contains_key(&binder_id) {
            return Err(StoreError::binder_not_found(binder_id));
        }
        if !inner.recipes.contains_key(&recipe_id) {
            return Err(StoreError::recipe_not_found(recipe_id));
        }

        let already = inner
            .memberships
            .values()
            .any(|m| m.binder_id == binder_id && m.recipe_id == recipe_id);
        if already {
            return Ok(());
        }

        let membership = Membership {
            id: inner.next_membership_id(),
            binder_id,
            recipe_id,
            added_at: now_millis(),
        };
        inner.memberships.insert(membership.id, membership);
        Ok(())
    }

    async fn remove_membership(&self, binder_id: BinderId, recipe_id: RecipeId) -> Result<()> {
        let mut inner = self.write()?;
        inner
            .memberships
            .retain(|_, m| !(m.binder_id == binder_id && m.recipe_id == recipe_id));
        Ok(())
    }

    async fn list_recipes_for_binder(&self, binder_id: BinderId) -> Result<Vec<RecipeId>> {
        let inner = self.read()?;
        Ok(inner
            .memberships
            .values()
            .filter(|m| m.binder_id == binder_id)
            .map(|m| m.recipe_id)
            .collect())
    }

    async fn list_binders_for_recipe(&self, recipe_id: RecipeId) -> Result<Vec<BinderId>> {
        let inner = self.read()?;
        Ok(inner
            .memberships
            .values()
            .filter(|m| m.recipe_id == recipe_id)
            .map(|m| m.binder_id)
            .collect())
    }
}
