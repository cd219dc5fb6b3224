//! Strong id definitions for the Larder engine.
//!
//! All identifiers are newtypes to prevent misuse at compile time.
//! Ids are opaque and allocated by the store; callers never construct
//! them from anything but a stored row.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create an id from its raw value.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the raw value.
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

define_id!(
    /// Identifies a user. Credential resolution happens outside the engine;
    /// callers hand us an already-authenticated subject id.
    UserId
);

define_id!(
    /// Identifies a recipe.
    RecipeId
);

define_id!(
    /// Identifies a binder (a named collection of recipes).
    BinderId
);

define_id!(
    /// Identifies a grant row.
    GrantId
);

define_id!(
    /// Identifies a binder-recipe membership row.
    MembershipId
);
