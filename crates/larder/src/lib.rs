//! # Larder
//!
//! The sharing and authorization engine of the Larder recipe manager.
//!
//! ## Overview
//!
//! Larder governs access to two resource kinds, recipes and binders
//! (named recipe collections). A user reaches a resource as its owner,
//! through a targeted grant, through an anonymous link share, or
//! transitively through membership of a shared binder - and the
//! effective permission is always the join (maximum) over every path.
//!
//! ## Key Concepts
//!
//! - **Grant**: a persisted sharing record; revocation soft-deletes it.
//! - **Link share**: a grant with no named target, redeemable by anyone
//!   presenting its share code.
//! - **Binder inheritance**: access granted on a binder extends, at the
//!   same level, to every recipe currently in it.
//! - **Fork-on-add**: adding a foreign recipe to one's own binder clones
//!   it first, so binders only ever contain recipes their owner owns.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use larder::{SharingEngine, Permission, UserId};
//! use larder::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("larder.db").unwrap();
//!     let engine = SharingEngine::new(store);
//!
//!     let alice = UserId::new(1);
//!     let bob = UserId::new(2);
//!
//!     let recipe = engine
//!         .create_recipe(alice, "Sourdough", "Feed starter. Wait. Bake.")
//!         .await
//!         .unwrap();
//!
//!     // Share it with bob at edit level.
//!     let grant = engine
//!         .share(alice, recipe.id.into(), Some(bob), Permission::Edit)
//!         .await
//!         .unwrap();
//!
//!     // Later: revoke.
//!     engine.revoke(alice, grant.id).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `larder::core` - domain types (ids, `Permission`, `Grant`, ...)
//! - `larder::store` - storage abstraction, SQLite and in-memory
//! - `larder::auth` - the authorization resolver and code generator

pub mod engine;
pub mod error;

// Re-export component crates
pub use larder_auth as auth;
pub use larder_core as core;
pub use larder_store as store;

// Re-export main types for convenience
pub use engine::SharingEngine;
pub use error::{EngineError, Result};

// Re-export commonly used core types
pub use larder_core::{
    Binder, BinderId, Grant, GrantId, Membership, MembershipId, Permission, Recipe, RecipeId,
    ResourceKind, ResourceRef, ShareCode, UserId,
};
