//! Effective-permission resolution.
//!
//! One algorithm replaces the scattered per-route ownership and grant
//! checks of a typical CRUD app: every path that reaches the resource
//! contributes a permission, and the result is their join. There is no
//! short-circuiting - a subject may be the target of a higher grant
//! than an incidentally presented lower-permission link code.

use larder_core::{
    BinderId, Permission, RecipeId, ResourceKind, ResourceRef, ShareCode, UserId,
};
use larder_store::{Store, StoreError};
use tracing::trace;

use crate::error::Result;

/// Compute the effective permission of `subject` on a resource.
///
/// `presented_code` is an optional share code taken from the request
/// (query parameter or route segment); it may name the resource itself
/// or, for recipes, one of its containing binders.
///
/// Returns `Ok(None)` for "no access". Fails only on store errors or
/// when the resource id itself does not exist.
pub async fn resolve<S: Store + ?Sized>(
    store: &S,
    subject: UserId,
    resource: ResourceRef,
    presented_code: Option<&ShareCode>,
) -> Result<Option<Permission>> {
    let effective = match resource {
        ResourceRef::Binder(id) => resolve_binder(store, subject, id, presented_code).await?,
        ResourceRef::Recipe(id) => resolve_recipe(store, subject, id, presented_code).await?,
    };

    trace!(subject = %subject, resource = %resource, ?effective, "resolved");
    Ok(effective)
}

async fn resolve_recipe<S: Store + ?Sized>(
    store: &S,
    subject: UserId,
    recipe_id: RecipeId,
    presented_code: Option<&ShareCode>,
) -> Result<Option<Permission>> {
    let recipe = store
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(|| StoreError::recipe_not_found(recipe_id))?;

    let mut effective = None;

    // Ownership.
    if recipe.owner_id == subject {
        effective = Permission::join_opt(effective, Some(Permission::Admin));
    }

    // Direct targeted grant.
    let direct = store
        .find_active_grant_for_subject(ResourceKind::Recipe, recipe_id.as_u64(), subject)
        .await?;
    effective = Permission::join_opt(effective, direct.map(|g| g.permission));

    // Presented link code.
    let via_code = code_contribution(
        store,
        subject,
        ResourceKind::Recipe,
        recipe_id.as_u64(),
        presented_code,
    )
    .await?;
    effective = Permission::join_opt(effective, via_code);

    // Binder inheritance, level-preserving: an edit grant on a binder
    // yields edit on its member recipes. Binders are not nested, so
    // this recurses exactly one level.
    for binder_id in store.list_binders_for_recipe(recipe_id).await? {
        let inherited = resolve_binder(store, subject, binder_id, presented_code).await?;
        effective = Permission::join_opt(effective, inherited);
    }

    Ok(effective)
}

async fn resolve_binder<S: Store + ?Sized>(
    store: &S,
    subject: UserId,
    binder_id: BinderId,
    presented_code: Option<&ShareCode>,
) -> Result<Option<Permission>> {
    let binder = store
        .get_binder(binder_id)
        .await?
        .ok_or_else(|| StoreError::binder_not_found(binder_id))?;

    let mut effective = None;

    if binder.owner_id == subject {
        effective = Permission::join_opt(effective, Some(Permission::Admin));
    }

    let direct = store
        .find_active_grant_for_subject(ResourceKind::Binder, binder_id.as_u64(), subject)
        .await?;
    effective = Permission::join_opt(effective, direct.map(|g| g.permission));

    let via_code = code_contribution(
        store,
        subject,
        ResourceKind::Binder,
        binder_id.as_u64(),
        presented_code,
    )
    .await?;
    effective = Permission::join_opt(effective, via_code);

    Ok(effective)
}

/// The contribution of a presented share code, if any.
///
/// The code must belong to this exact resource, and targeted grants
/// only redeem for their named target; link grants redeem for anyone.
async fn code_contribution<S: Store + ?Sized>(
    store: &S,
    subject: UserId,
    kind: ResourceKind,
    resource_id: u64,
    presented_code: Option<&ShareCode>,
) -> Result<Option<Permission>> {
    let Some(code) = presented_code else {
        return Ok(None);
    };

    match store.find_active_grant_by_code(kind, code).await? {
        Some(grant) if grant.resource_id == resource_id && grant.code_redeemable_by(subject) => {
            Ok(Some(grant.permission))
        }
        _ => Ok(None),
    }
}
