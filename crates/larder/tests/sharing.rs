//! End-to-end sharing scenarios through the engine.
//!
//! These exercise the full stack (engine -> resolver -> store) against
//! both backends, pinning the behaviors the HTTP layer relies on:
//! ownership supremacy, soft-delete revocation, join over multiple
//! access paths, level-preserving binder inheritance, link-code
//! scoping, and the fork-on-add rule.

use larder::store::{MemoryStore, SqliteStore, Store};
use larder::{EngineError, Permission, ShareCode, SharingEngine, UserId};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn engine() -> SharingEngine<MemoryStore> {
    init_logging();
    SharingEngine::new(MemoryStore::new())
}

const ALICE: UserId = UserId::new(1);
const BOB: UserId = UserId::new(2);
const CAROL: UserId = UserId::new(3);

#[tokio::test]
async fn owner_always_resolves_to_admin() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();

    // Grants targeting the owner cannot lower the result.
    engine
        .share(ALICE, recipe.id.into(), Some(ALICE), Permission::View)
        .await
        .unwrap();

    let p = engine
        .check_access(ALICE, recipe.id.into(), None)
        .await
        .unwrap();
    assert_eq!(p, Some(Permission::Admin));
}

#[tokio::test]
async fn only_the_owner_may_share_or_list() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();

    let err = engine
        .share(BOB, recipe.id.into(), Some(CAROL), Permission::View)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotOwner { .. }));

    let err = engine
        .list_shares(BOB, recipe.id.into())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotOwner { .. }));
}

#[tokio::test]
async fn revocation_removes_access_and_is_idempotent() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();

    let grant = engine
        .share(ALICE, recipe.id.into(), Some(BOB), Permission::Edit)
        .await
        .unwrap();
    assert_eq!(
        engine
            .check_access(BOB, recipe.id.into(), None)
            .await
            .unwrap(),
        Some(Permission::Edit)
    );

    engine.revoke(ALICE, grant.id).await.unwrap();
    assert_eq!(
        engine
            .check_access(BOB, recipe.id.into(), None)
            .await
            .unwrap(),
        None
    );

    // Second revoke is a no-op success; the row survives as history.
    engine.revoke(ALICE, grant.id).await.unwrap();
    let stored = engine.store().get_grant(grant.id).await.unwrap().unwrap();
    assert!(!stored.is_active);
}

#[tokio::test]
async fn revoke_is_owner_only() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();
    let grant = engine
        .share(ALICE, recipe.id.into(), Some(BOB), Permission::View)
        .await
        .unwrap();

    let err = engine.revoke(BOB, grant.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotOwner { .. }));

    // Bob's access is intact.
    assert_eq!(
        engine
            .check_access(BOB, recipe.id.into(), None)
            .await
            .unwrap(),
        Some(Permission::View)
    );
}

#[tokio::test]
async fn effective_permission_joins_all_paths() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();

    engine
        .share(ALICE, recipe.id.into(), Some(BOB), Permission::View)
        .await
        .unwrap();
    engine
        .share(ALICE, recipe.id.into(), Some(BOB), Permission::Admin)
        .await
        .unwrap();

    assert_eq!(
        engine
            .check_access(BOB, recipe.id.into(), None)
            .await
            .unwrap(),
        Some(Permission::Admin)
    );
}

#[tokio::test]
async fn binder_share_extends_to_member_recipes_at_same_level() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();
    let binder = engine.create_binder(ALICE, "Winter").await.unwrap();
    engine
        .add_recipe_to_binder(ALICE, binder.id, recipe.id, None)
        .await
        .unwrap();

    engine
        .share(ALICE, binder.id.into(), Some(BOB), Permission::Edit)
        .await
        .unwrap();

    // Edit on the binder means edit on the recipe, not merely view.
    assert_eq!(
        engine
            .check_access(BOB, recipe.id.into(), None)
            .await
            .unwrap(),
        Some(Permission::Edit)
    );

    // And the edit is actually usable.
    engine
        .update_recipe(BOB, recipe.id, "Soup", "Boil, then season.", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn link_share_works_for_anyone_targeted_code_does_not() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();

    let link = engine
        .share(ALICE, recipe.id.into(), None, Permission::View)
        .await
        .unwrap();
    let targeted = engine
        .share(ALICE, recipe.id.into(), Some(BOB), Permission::Edit)
        .await
        .unwrap();

    // Anyone with the link code gets view.
    assert_eq!(
        engine
            .check_access(CAROL, recipe.id.into(), Some(&link.share_code))
            .await
            .unwrap(),
        Some(Permission::View)
    );

    // Bob's targeted code is worthless to Carol.
    assert_eq!(
        engine
            .check_access(CAROL, recipe.id.into(), Some(&targeted.share_code))
            .await
            .unwrap(),
        None
    );

    // Bob presenting his own code gets his level.
    assert_eq!(
        engine
            .check_access(BOB, recipe.id.into(), Some(&targeted.share_code))
            .await
            .unwrap(),
        Some(Permission::Edit)
    );
}

#[tokio::test]
async fn presented_code_cannot_lower_a_targeted_grant() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();

    engine
        .share(ALICE, recipe.id.into(), Some(BOB), Permission::Admin)
        .await
        .unwrap();
    let link = engine
        .share(ALICE, recipe.id.into(), None, Permission::View)
        .await
        .unwrap();

    // Bob arrives via the view link but is also a named admin; join wins.
    assert_eq!(
        engine
            .check_access(BOB, recipe.id.into(), Some(&link.share_code))
            .await
            .unwrap(),
        Some(Permission::Admin)
    );
}

#[tokio::test]
async fn adding_own_recipe_links_without_cloning() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();
    let binder = engine.create_binder(ALICE, "Winter").await.unwrap();

    let linked = engine
        .add_recipe_to_binder(ALICE, binder.id, recipe.id, None)
        .await
        .unwrap();
    assert_eq!(linked, recipe.id);

    // Idempotent: adding again changes nothing.
    engine
        .add_recipe_to_binder(ALICE, binder.id, recipe.id, None)
        .await
        .unwrap();
    assert_eq!(
        engine.binder_contents(binder.id).await.unwrap(),
        vec![recipe.id]
    );
}

#[tokio::test]
async fn adding_foreign_recipe_forks_a_caller_owned_clone() {
    let engine = engine();
    let original = engine
        .create_recipe(ALICE, "Curry", "Fry paste. Add coconut milk.")
        .await
        .unwrap();
    engine
        .share(ALICE, original.id.into(), Some(BOB), Permission::View)
        .await
        .unwrap();
    let binder = engine.create_binder(BOB, "To Cook").await.unwrap();

    let clone_id = engine
        .add_recipe_to_binder(BOB, binder.id, original.id, None)
        .await
        .unwrap();

    // The binder holds a new recipe owned by Bob, never the original.
    assert_ne!(clone_id, original.id);
    assert_eq!(
        engine.binder_contents(binder.id).await.unwrap(),
        vec![clone_id]
    );

    let clone = engine.store().get_recipe(clone_id).await.unwrap().unwrap();
    assert_eq!(clone.owner_id, BOB);
    assert_eq!(clone.body, original.body);

    // The original is unmodified and still Alice's.
    let source = engine
        .store()
        .get_recipe(original.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(source.owner_id, ALICE);
    assert_eq!(source.body, original.body);

    // Bob fully controls his clone.
    engine.delete_recipe(BOB, clone_id).await.unwrap();
}

#[tokio::test]
async fn fork_requires_access_to_the_source() {
    let engine = engine();
    let original = engine.create_recipe(ALICE, "Curry", "Secret.").await.unwrap();
    let binder = engine.create_binder(BOB, "To Cook").await.unwrap();

    let err = engine
        .add_recipe_to_binder(BOB, binder.id, original.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AccessDenied { .. }));
    assert!(engine.binder_contents(binder.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn fork_works_through_a_link_code() {
    let engine = engine();
    let original = engine.create_recipe(ALICE, "Curry", "Fry.").await.unwrap();
    let link = engine
        .share(ALICE, original.id.into(), None, Permission::View)
        .await
        .unwrap();
    let binder = engine.create_binder(BOB, "To Cook").await.unwrap();

    let clone_id = engine
        .add_recipe_to_binder(BOB, binder.id, original.id, Some(&link.share_code))
        .await
        .unwrap();
    assert_ne!(clone_id, original.id);
}

#[tokio::test]
async fn view_grant_does_not_allow_updates() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();
    engine
        .share(ALICE, recipe.id.into(), Some(BOB), Permission::View)
        .await
        .unwrap();

    let err = engine
        .update_recipe(BOB, recipe.id, "Soup", "Ruined.", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AccessDenied { .. }));

    let err = engine.delete_recipe(BOB, recipe.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotOwner { .. }));
}

#[tokio::test]
async fn deleting_a_recipe_revokes_its_grants() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();
    let grant = engine
        .share(ALICE, recipe.id.into(), Some(BOB), Permission::Edit)
        .await
        .unwrap();

    engine.delete_recipe(ALICE, recipe.id).await.unwrap();

    let stored = engine.store().get_grant(grant.id).await.unwrap().unwrap();
    assert!(!stored.is_active);
}

#[tokio::test]
async fn read_recipe_honors_share_codes() {
    let engine = engine();
    let recipe = engine
        .create_recipe(ALICE, "Soup", "Boil water. Add salt.")
        .await
        .unwrap();
    let link = engine
        .share(ALICE, recipe.id.into(), None, Permission::View)
        .await
        .unwrap();

    let fetched = engine
        .read_recipe(CAROL, recipe.id, Some(&link.share_code))
        .await
        .unwrap();
    assert_eq!(fetched.body, "Boil water. Add salt.");

    let err = engine.read_recipe(CAROL, recipe.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::AccessDenied { .. }));
}

#[tokio::test]
async fn bogus_code_grants_nothing() {
    let engine = engine();
    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();

    let p = engine
        .check_access(BOB, recipe.id.into(), Some(&ShareCode::new("nope")))
        .await
        .unwrap();
    assert_eq!(p, None);
}

// The same core scenario against the SQLite backend, to catch
// divergence between the two stores.
#[tokio::test]
async fn sqlite_backend_end_to_end() {
    init_logging();
    let engine = SharingEngine::new(SqliteStore::open_memory().unwrap());

    let recipe = engine.create_recipe(ALICE, "Soup", "Boil.").await.unwrap();
    let binder = engine.create_binder(ALICE, "Winter").await.unwrap();
    engine
        .add_recipe_to_binder(ALICE, binder.id, recipe.id, None)
        .await
        .unwrap();

    let grant = engine
        .share(ALICE, binder.id.into(), Some(BOB), Permission::Edit)
        .await
        .unwrap();
    assert_eq!(
        engine
            .check_access(BOB, recipe.id.into(), None)
            .await
            .unwrap(),
        Some(Permission::Edit)
    );

    engine.revoke(ALICE, grant.id).await.unwrap();
    assert_eq!(
        engine
            .check_access(BOB, recipe.id.into(), None)
            .await
            .unwrap(),
        None
    );

    // Fork-on-add across users.
    engine
        .share(ALICE, recipe.id.into(), Some(BOB), Permission::View)
        .await
        .unwrap();
    let bobs_binder = engine.create_binder(BOB, "Mine").await.unwrap();
    let clone_id = engine
        .add_recipe_to_binder(BOB, bobs_binder.id, recipe.id, None)
        .await
        .unwrap();
    assert_ne!(clone_id, recipe.id);
    let clone = engine.store().get_recipe(clone_id).await.unwrap().unwrap();
    assert_eq!(clone.owner_id, BOB);
}
