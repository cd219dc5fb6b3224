//! Resource types: recipes, binders, and the tagged reference the
//! resolver takes as input.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::{BinderId, RecipeId, UserId};

/// A recipe. The owner exclusively controls grants and deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Store-allocated id.
    pub id: RecipeId,

    /// The user who exclusively controls this recipe.
    pub owner_id: UserId,

    /// Recipe title.
    pub title: String,

    /// Recipe body (ingredients, steps) as text.
    pub body: String,

    /// Creation time (Unix ms).
    pub created_at: i64,
}

/// A binder: a named collection of recipes.
///
/// Binders only ever contain recipes their owner actually owns; adding
/// a foreign recipe clones it first (fork-on-add).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binder {
    /// Store-allocated id.
    pub id: BinderId,

    /// The user who exclusively controls this binder.
    pub owner_id: UserId,

    /// Binder name.
    pub name: String,

    /// Creation time (Unix ms).
    pub created_at: i64,
}

/// The kind of a shareable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A recipe.
    Recipe,
    /// A binder.
    Binder,
}

impl ResourceKind {
    /// Stable textual form, used for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Recipe => "recipe",
            ResourceKind::Binder => "binder",
        }
    }

    /// Parse the stored textual form.
    pub fn from_str_opt(s: &str) -> Option<ResourceKind> {
        match s {
            "recipe" => Some(ResourceKind::Recipe),
            "binder" => Some(ResourceKind::Binder),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed reference to a shareable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceRef {
    /// A recipe reference.
    Recipe(RecipeId),
    /// A binder reference.
    Binder(BinderId),
}

impl ResourceRef {
    /// The kind of the referenced resource.
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::Recipe(_) => ResourceKind::Recipe,
            ResourceRef::Binder(_) => ResourceKind::Binder,
        }
    }

    /// The raw id of the referenced resource.
    pub fn raw_id(&self) -> u64 {
        match self {
            ResourceRef::Recipe(id) => id.as_u64(),
            ResourceRef::Binder(id) => id.as_u64(),
        }
    }
}

impl From<RecipeId> for ResourceRef {
    fn from(id: RecipeId) -> Self {
        ResourceRef::Recipe(id)
    }
}

impl From<BinderId> for ResourceRef {
    fn from(id: BinderId) -> Self {
        ResourceRef::Binder(id)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.raw_id())
    }
}
