//! Grant and membership records.
//!
//! A grant authorizes some permission level on a resource, either to a
//! named user or as an anonymous link. Grants are append-only history:
//! revocation sets `is_active = false`, the row is never deleted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::{BinderId, GrantId, MembershipId, RecipeId, UserId};
use crate::permission::Permission;
use crate::resource::ResourceKind;

/// An opaque share code.
///
/// Every grant carries one, even targeted grants, so a share can be
/// redeemed either by login or by link. Codes are drawn from a space
/// large enough that collisions are handled by a uniqueness constraint
/// plus retry, never by pre-checking.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareCode(String);

impl ShareCode {
    /// Wrap an already-encoded code (e.g. read back from the store or
    /// taken from a request path).
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Encode raw random bytes as a code.
    pub fn from_entropy(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// The textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Codes are capabilities; keep logs to a prefix.
        let shown = self.0.get(..8).unwrap_or(&self.0);
        write!(f, "ShareCode({}..)", shown)
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted sharing grant for a recipe or binder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Store-allocated id.
    pub id: GrantId,

    /// Which kind of resource this grant covers.
    pub resource_kind: ResourceKind,

    /// The resource's raw id (interpreted per `resource_kind`).
    pub resource_id: u64,

    /// The resource's owner at grant time. Only this user may revoke.
    pub owner_id: UserId,

    /// The named target, or `None` for a link share redeemable by anyone
    /// presenting the code.
    pub shared_with_id: Option<UserId>,

    /// The permission level this grant conveys.
    pub permission: Permission,

    /// The grant's share code. Unique across all grants.
    pub share_code: ShareCode,

    /// Whether the grant is live. Revocation clears this; the row stays.
    pub is_active: bool,

    /// Creation time (Unix ms).
    pub created_at: i64,
}

impl Grant {
    /// Whether `subject` may redeem this grant's share code.
    ///
    /// Link shares (`shared_with_id = None`) are universally redeemable;
    /// targeted grants only by their named target.
    pub fn code_redeemable_by(&self, subject: UserId) -> bool {
        match self.shared_with_id {
            None => true,
            Some(target) => target == subject,
        }
    }
}

/// The fields of a grant before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewGrant {
    /// Which kind of resource this grant covers.
    pub resource_kind: ResourceKind,
    /// The resource's raw id.
    pub resource_id: u64,
    /// The resource's owner.
    pub owner_id: UserId,
    /// The named target, or `None` for a link share.
    pub shared_with_id: Option<UserId>,
    /// The permission level.
    pub permission: Permission,
    /// The freshly generated share code.
    pub share_code: ShareCode,
    /// Creation time (Unix ms).
    pub created_at: i64,
}

/// A binder-recipe membership row.
///
/// Membership is independent of sharing: it records containment only,
/// and never implies the binder's owner owns the recipe. The engine's
/// fork-on-add rule makes that implication hold anyway for rows it
/// creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Store-allocated id.
    pub id: MembershipId,

    /// The containing binder.
    pub binder_id: BinderId,

    /// The contained recipe.
    pub recipe_id: RecipeId,

    /// When the recipe was added (Unix ms).
    pub added_at: i64,
}
