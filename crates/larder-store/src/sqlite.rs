//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the Larder engine. It uses
//! rusqlite with bundled SQLite, wrapped in async via
//! `tokio::spawn_blocking`. Compound writes (cascading deletes,
//! fork-on-add) run inside a single transaction so concurrent readers
//! observe pre- or post-state only.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use larder_core::{
    Binder, BinderId, Grant, GrantId, NewGrant, Permission, Recipe, RecipeId, ResourceKind,
    ShareCode, UserId,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::now_millis;
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Runtime(e.to_string()))?
    }
}

// Row decoding helpers. Enum columns are stored as text; unknown values
// mean the database was written by something newer than us.

fn bad_column(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, msg)),
    )
}

fn row_to_recipe(row: &rusqlite::Row<'_>) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: RecipeId::new(row.get::<_, i64>("recipe_id")? as u64),
        owner_id: UserId::new(row.get::<_, i64>("owner_id")? as u64),
        title: row.get("title")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_binder(row: &rusqlite::Row<'_>) -> rusqlite::Result<Binder> {
    Ok(Binder {
        id: BinderId::new(row.get::<_, i64>("binder_id")? as u64),
        owner_id: UserId::new(row.get::<_, i64>("owner_id")? as u64),
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_grant(row: &rusqlite::Row<'_>) -> rusqlite::Result<Grant> {
    let kind_text: String = row.get("resource_kind")?;
    let kind = ResourceKind::from_str_opt(&kind_text)
        .ok_or_else(|| bad_column(1, format!("unknown resource kind: {}", kind_text)))?;

    let perm_text: String = row.get("permission")?;
    let permission = Permission::from_str_opt(&perm_text)
        .ok_or_else(|| bad_column(5, format!("unknown permission: {}", perm_text)))?;

    Ok(Grant {
        id: GrantId::new(row.get::<_, i64>("grant_id")? as u64),
        resource_kind: kind,
        resource_id: row.get::<_, i64>("resource_id")? as u64,
        owner_id: UserId::new(row.get::<_, i64>("owner_id")? as u64),
        shared_with_id: row
            .get::<_, Option<i64>>("shared_with_id")?
            .map(|v| UserId::new(v as u64)),
        permission,
        share_code: ShareCode::new(row.get::<_, String>("share_code")?),
        is_active: row.get::<_, i64>("is_active")? != 0,
        created_at: row.get("created_at")?,
    })
}

const GRANT_COLUMNS: &str = "grant_id, resource_kind, resource_id, owner_id, shared_with_id, \
                             permission, share_code, is_active, created_at";

/// Map a grant-insert failure, separating share-code collisions from
/// real database errors.
fn map_grant_insert_err(e: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(f, Some(msg)) = &e {
        if f.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains("share_code") {
            return StoreError::ShareCodeCollision;
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_recipe(&self, owner_id: UserId, title: &str, body: &str) -> Result<Recipe> {
        let title = title.to_string();
        let body = body.to_string();

        self.with_conn(move |conn| {
            let now = now_millis();
            conn.execute(
                "INSERT INTO recipes (owner_id, title, body, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![owner_id.as_u64() as i64, title, body, now],
            )?;
            let id = RecipeId::new(conn.last_insert_rowid() as u64);
            debug!(recipe = %id, owner = %owner_id, "recipe created");
            Ok(Recipe {
                id,
                owner_id,
                title,
                body,
                created_at: now,
            })
        })
        .await
    }

    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT recipe_id, owner_id, title, body, created_at
                 FROM recipes WHERE recipe_id = ?1",
                params![id.as_u64() as i64],
                row_to_recipe,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn update_recipe(&self, id: RecipeId, title: &str, body: &str) -> Result<()> {
        let title = title.to_string();
        let body = body.to_string();

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE recipes SET title = ?2, body = ?3 WHERE recipe_id = ?1",
                params![id.as_u64() as i64, title, body],
            )?;
            if changed == 0 {
                return Err(StoreError::recipe_not_found(id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_recipe(&self, id: RecipeId) -> Result<()> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let deleted = tx.execute(
                "DELETE FROM recipes WHERE recipe_id = ?1",
                params![id.as_u64() as i64],
            )?;
            if deleted == 0 {
                return Err(StoreError::recipe_not_found(id));
            }

            tx.execute(
                "UPDATE grants SET is_active = 0
                 WHERE resource_kind = 'recipe' AND resource_id = ?1",
                params![id.as_u64() as i64],
            )?;
            tx.execute(
                "DELETE FROM memberships WHERE recipe_id = ?1",
                params![id.as_u64() as i64],
            )?;

            tx.commit()?;
            debug!(recipe = %id, "recipe deleted with cascade");
            Ok(())
        })
        .await
    }

    async fn list_recipes_for_owner(&self, owner_id: UserId) -> Result<Vec<Recipe>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT recipe_id, owner_id, title, body, created_at
                 FROM recipes WHERE owner_id = ?1 ORDER BY recipe_id",
            )?;
            let recipes = stmt
                .query_map(params![owner_id.as_u64() as i64], row_to_recipe)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(recipes)
        })
        .await
    }

    async fn create_binder(&self, owner_id: UserId, name: &str) -> Result<Binder> {
        let name = name.to_string();

        self.with_conn(move |conn| {
            let now = now_millis();
            conn.execute(
                "INSERT INTO binders (owner_id, name, created_at) VALUES (?1, ?2, ?3)",
                params![owner_id.as_u64() as i64, name, now],
            )?;
            let id = BinderId::new(conn.last_insert_rowid() as u64);
            debug!(binder = %id, owner = %owner_id, "binder created");
            Ok(Binder {
                id,
                owner_id,
                name,
                created_at: now,
            })
        })
        .await
    }

    async fn get_binder(&self, id: BinderId) -> Result<Option<Binder>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT binder_id, owner_id, name, created_at FROM binders WHERE binder_id = ?1",
                params![id.as_u64() as i64],
                row_to_binder,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn delete_binder(&self, id: BinderId) -> Result<()> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let deleted = tx.execute(
                "DELETE FROM binders WHERE binder_id = ?1",
                params![id.as_u64() as i64],
            )?;
            if deleted == 0 {
                return Err(StoreError::binder_not_found(id));
            }

            tx.execute(
                "UPDATE grants SET is_active = 0
                 WHERE resource_kind = 'binder' AND resource_id = ?1",
                params![id.as_u64() as i64],
            )?;
            tx.execute(
                "DELETE FROM memberships WHERE binder_id = ?1",
                params![id.as_u64() as i64],
            )?;

            tx.commit()?;
            debug!(binder = %id, "binder deleted with cascade");
            Ok(())
        })
        .await
    }

    async fn list_binders_for_owner(&self, owner_id: UserId) -> Result<Vec<Binder>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT binder_id, owner_id, name, created_at
                 FROM binders WHERE owner_id = ?1 ORDER BY binder_id",
            )?;
            let binders = stmt
                .query_map(params![owner_id.as_u64() as i64], row_to_binder)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(binders)
        })
        .await
    }

    async fn fork_recipe_into_binder(
        &self,
        recipe_id: RecipeId,
        new_owner: UserId,
        binder_id: BinderId,
    ) -> Result<Recipe> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let source = tx
                .query_row(
                    "SELECT recipe_id, owner_id, title, body, created_at
                     FROM recipes WHERE recipe_id = ?1",
                    params![recipe_id.as_u64() as i64],
                    row_to_recipe,
                )
                .optional()?
                .ok_or_else(|| StoreError::recipe_not_found(recipe_id))?;

            let binder_exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM binders WHERE binder_id = ?1)",
                params![binder_id.as_u64() as i64],
                |row| row.get(0),
            )?;
            if !binder_exists {
                return Err(StoreError::binder_not_found(binder_id));
            }

            let now = now_millis();
            tx.execute(
                "INSERT INTO recipes (owner_id, title, body, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![new_owner.as_u64() as i64, source.title, source.body, now],
            )?;
            let clone_id = RecipeId::new(tx.last_insert_rowid() as u64);

            tx.execute(
                "INSERT INTO memberships (binder_id, recipe_id, added_at) VALUES (?1, ?2, ?3)",
                params![binder_id.as_u64() as i64, clone_id.as_u64() as i64, now],
            )?;

            tx.commit()?;
            debug!(
                source = %recipe_id, clone = %clone_id, binder = %binder_id,
                "recipe forked into binder"
            );

            Ok(Recipe {
                id: clone_id,
                owner_id: new_owner,
                title: source.title,
                body: source.body,
                created_at: now,
            })
        })
        .await
    }

    async fn insert_grant(&self, grant: NewGrant) -> Result<Grant> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO grants (
                    resource_kind, resource_id, owner_id, shared_with_id,
                    permission, share_code, is_active, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
                params![
                    grant.resource_kind.as_str(),
                    grant.resource_id as i64,
                    grant.owner_id.as_u64() as i64,
                    grant.shared_with_id.map(|u| u.as_u64() as i64),
                    grant.permission.as_str(),
                    grant.share_code.as_str(),
                    grant.created_at,
                ],
            )
            .map_err(map_grant_insert_err)?;

            let id = GrantId::new(conn.last_insert_rowid() as u64);
            debug!(
                grant = %id, kind = %grant.resource_kind, resource = grant.resource_id,
                "grant inserted"
            );

            Ok(Grant {
                id,
                resource_kind: grant.resource_kind,
                resource_id: grant.resource_id,
                owner_id: grant.owner_id,
                shared_with_id: grant.shared_with_id,
                permission: grant.permission,
                share_code: grant.share_code,
                is_active: true,
                created_at: grant.created_at,
            })
        })
        .await
    }

    async fn get_grant(&self, id: GrantId) -> Result<Option<Grant>> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM grants WHERE grant_id = ?1", GRANT_COLUMNS),
                params![id.as_u64() as i64],
                row_to_grant,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn find_active_grants(&self, kind: ResourceKind, resource_id: u64) -> Result<Vec<Grant>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM grants
                 WHERE resource_kind = ?1 AND resource_id = ?2 AND is_active = 1
                 ORDER BY grant_id",
                GRANT_COLUMNS
            ))?;
            let grants = stmt
                .query_map(params![kind.as_str(), resource_id as i64], row_to_grant)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(grants)
        })
        .await
    }

    async fn find_active_grant_for_subject(
        &self,
        kind: ResourceKind,
        resource_id: u64,
        subject: UserId,
    ) -> Result<Option<Grant>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM grants
                 WHERE resource_kind = ?1 AND resource_id = ?2
                   AND shared_with_id = ?3 AND is_active = 1",
                GRANT_COLUMNS
            ))?;
            let grants = stmt
                .query_map(
                    params![kind.as_str(), resource_id as i64, subject.as_u64() as i64],
                    row_to_grant,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            // Permission is stored as text, so rank in Rust rather than SQL.
            Ok(grants.into_iter().max_by_key(|g| g.permission))
        })
        .await
    }

    async fn find_active_grant_by_code(
        &self,
        kind: ResourceKind,
        code: &ShareCode,
    ) -> Result<Option<Grant>> {
        let code = code.as_str().to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {} FROM grants
                     WHERE resource_kind = ?1 AND share_code = ?2 AND is_active = 1",
                    GRANT_COLUMNS
                ),
                params![kind.as_str(), code],
                row_to_grant,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn deactivate_grant(&self, id: GrantId) -> Result<()> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE grants SET is_active = 0 WHERE grant_id = ?1",
                params![id.as_u64() as i64],
            )?;
            if changed > 0 {
                debug!(grant = %id, "grant deactivated");
            }
            Ok(())
        })
        .await
    }

    async fn add_membership(&self, binder_id: BinderId, recipe_id: RecipeId) -> Result<()> {
        self.with_conn(move |conn| {
            let binder_exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM binders WHERE binder_id = ?1)",
                params![binder_id.as_u64() as i64],
                |row| row.get(0),
            )?;
            if !binder_exists {
                return Err(StoreError::binder_not_found(binder_id));
            }
            let recipe_exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM recipes WHERE recipe_id = ?1)",
                params![recipe_id.as_u64() as i64],
                |row| row.get(0),
            )?;
            if !recipe_exists {
                return Err(StoreError::recipe_not_found(recipe_id));
            }

            conn.execute(
                "INSERT OR IGNORE INTO memberships (binder_id, recipe_id, added_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    binder_id.as_u64() as i64,
                    recipe_id.as_u64() as i64,
                    now_millis()
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove_membership(&self, binder_id: BinderId, recipe_id: RecipeId) -> Result<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM memberships WHERE binder_id = ?1 AND recipe_id = ?2",
                params![binder_id.as_u64() as i64, recipe_id.as_u64() as i64],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_recipes_for_binder(&self, binder_id: BinderId) -> Result<Vec<RecipeId>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT recipe_id FROM memberships WHERE binder_id = ?1 ORDER BY membership_id",
            )?;
            let ids = stmt
                .query_map(params![binder_id.as_u64() as i64], |row| {
                    row.get::<_, i64>(0).map(|v| RecipeId::new(v as u64))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
        .await
    }

    async fn list_binders_for_recipe(&self, recipe_id: RecipeId) -> Result<Vec<BinderId>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT binder_id FROM memberships WHERE recipe_id = ?1 ORDER BY membership_id",
            )?;
            let ids = stmt
                .query_map(params![recipe_id.as_u64() as i64], |row| {
                    row.get::<_, i64>(0).map(|v| BinderId::new(v as u64))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
        .await
    }
}
