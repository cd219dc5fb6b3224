//! # Larder Core
//!
//! Domain types for the Larder sharing engine.
//!
//! ## Overview
//!
//! This crate defines the vocabulary the rest of the engine speaks:
//!
//! - **Ids**: newtype identifiers for users, recipes, binders, grants
//! - **Permission**: the three-level ordered lattice (`view < edit < admin`)
//! - **Resources**: `Recipe` and `Binder`, each exclusively controlled by its owner
//! - **Grant**: a persisted sharing record, soft-deleted on revocation
//! - **Membership**: a binder-to-recipe link, independent of sharing
//!
//! ## Key Concepts
//!
//! - A grant either targets a named user (`shared_with_id` set) or is a
//!   link share (`shared_with_id` absent, redeemable via its share code).
//! - Every grant carries a share code, even targeted ones, so either
//!   access mode works.
//! - Revocation flips `is_active`; grant rows are append-only history.

pub mod grant;
pub mod id;
pub mod permission;
pub mod resource;

pub use grant::{Grant, Membership, NewGrant, ShareCode};
pub use id::{BinderId, GrantId, MembershipId, RecipeId, UserId};
pub use permission::Permission;
pub use resource::{Binder, Recipe, ResourceKind, ResourceRef};
