//! The permission lattice.
//!
//! Three levels, totally ordered: `view < edit < admin`. Effective
//! permissions are always the join (maximum) of every path that yields
//! one; there is no "lowest wins" anywhere in the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A permission level on a recipe or binder.
///
/// The derived `Ord` carries the lattice order, so `join` is `max` and
/// requirement checks are plain comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Read-only access.
    View,
    /// Read and modify content.
    Edit,
    /// Full control short of ownership transfer. Owners always hold this.
    Admin,
}

impl Permission {
    /// The join of two permissions: the higher of the two.
    pub fn join(self, other: Permission) -> Permission {
        self.max(other)
    }

    /// Whether this permission meets a required level.
    pub fn satisfies(self, need: Permission) -> bool {
        self >= need
    }

    /// Stable textual form, used for persistence and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::View => "view",
            Permission::Edit => "edit",
            Permission::Admin => "admin",
        }
    }

    /// Parse the stored textual form.
    pub fn from_str_opt(s: &str) -> Option<Permission> {
        match s {
            "view" => Some(Permission::View),
            "edit" => Some(Permission::Edit),
            "admin" => Some(Permission::Admin),
            _ => None,
        }
    }

    /// Join an optional permission into an accumulator.
    ///
    /// Convenience for the resolver, which folds contributions from
    /// several independent paths.
    pub fn join_opt(acc: Option<Permission>, contribution: Option<Permission>) -> Option<Permission> {
        match (acc, contribution) {
            (Some(a), Some(b)) => Some(a.join(b)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_permission() -> impl Strategy<Value = Permission> {
        prop_oneof![
            Just(Permission::View),
            Just(Permission::Edit),
            Just(Permission::Admin),
        ]
    }

    #[test]
    fn test_total_order() {
        assert!(Permission::View < Permission::Edit);
        assert!(Permission::Edit < Permission::Admin);
        assert!(Permission::View < Permission::Admin);
    }

    #[test]
    fn test_satisfies() {
        assert!(Permission::Admin.satisfies(Permission::View));
        assert!(Permission::Edit.satisfies(Permission::Edit));
        assert!(!Permission::View.satisfies(Permission::Edit));
    }

    #[test]
    fn test_join_opt_folding() {
        assert_eq!(Permission::join_opt(None, None), None);
        assert_eq!(
            Permission::join_opt(None, Some(Permission::View)),
            Some(Permission::View)
        );
        assert_eq!(
            Permission::join_opt(Some(Permission::Edit), Some(Permission::View)),
            Some(Permission::Edit)
        );
        assert_eq!(
            Permission::join_opt(Some(Permission::View), None),
            Some(Permission::View)
        );
    }

    #[test]
    fn test_str_roundtrip() {
        for p in [Permission::View, Permission::Edit, Permission::Admin] {
            assert_eq!(Permission::from_str_opt(p.as_str()), Some(p));
        }
        assert_eq!(Permission::from_str_opt("owner"), None);
    }

    proptest! {
        #[test]
        fn join_is_commutative(a in any_permission(), b in any_permission()) {
            prop_assert_eq!(a.join(b), b.join(a));
        }

        #[test]
        fn join_is_idempotent(a in any_permission()) {
            prop_assert_eq!(a.join(a), a);
        }

        #[test]
        fn join_is_associative(
            a in any_permission(),
            b in any_permission(),
            c in any_permission(),
        ) {
            prop_assert_eq!(a.join(b).join(c), a.join(b.join(c)));
        }

        #[test]
        fn join_satisfies_both_operands(a in any_permission(), b in any_permission()) {
            let j = a.join(b);
            prop_assert!(j.satisfies(a));
            prop_assert!(j.satisfies(b));
        }
    }
}
