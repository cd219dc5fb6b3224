//! Database schema migrations for SQLite.
//!
//! A simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::now_millis;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Recipes: body is free text, owner exclusively controls the row
        CREATE TABLE recipes (
            recipe_id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Binders: named collections of recipes
        CREATE TABLE binders (
            binder_id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Grants: append-only sharing records; revocation flips is_active
        CREATE TABLE grants (
            grant_id INTEGER PRIMARY KEY AUTOINCREMENT,
            resource_kind TEXT NOT NULL,        -- 'recipe' | 'binder'
            resource_id INTEGER NOT NULL,       -- interpreted per resource_kind
            owner_id INTEGER NOT NULL,          -- resource owner at grant time
            shared_with_id INTEGER,             -- NULL = link share
            permission TEXT NOT NULL,           -- 'view' | 'edit' | 'admin'
            share_code TEXT NOT NULL UNIQUE,    -- opaque token, collision -> retry
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL
        );

        -- Binder-recipe containment, independent of sharing
        CREATE TABLE memberships (
            membership_id INTEGER PRIMARY KEY AUTOINCREMENT,
            binder_id INTEGER NOT NULL,
            recipe_id INTEGER NOT NULL,
            added_at INTEGER NOT NULL,

            UNIQUE(binder_id, recipe_id)
        );

        -- Indexes for common queries
        CREATE INDEX idx_recipes_owner ON recipes(owner_id);
        CREATE INDEX idx_binders_owner ON binders(owner_id);
        CREATE INDEX idx_grants_resource ON grants(resource_kind, resource_id, is_active);
        CREATE INDEX idx_grants_subject ON grants(shared_with_id);
        CREATE INDEX idx_memberships_recipe ON memberships(recipe_id);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"recipes".to_string()));
        assert!(tables.contains(&"binders".to_string()));
        assert!(tables.contains(&"grants".to_string()));
        assert!(tables.contains(&"memberships".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }
}
