//! Database Connection Management
//!
//! This module provides the database connection, schema initialization and
//! the raw SQL operations for the hierarchy tables, using libsql.
//!
//! # Architecture
//!
//! - **One table per tree**: `categories` and `locations` share a layout and
//!   are selected by [`TreeKind`]
//! - **Self-referencing parent**: `parent_id` references the same table with
//!   `ON DELETE CASCADE`, so deleting a node removes its subtree
//! - **Foreign keys per connection**: SQLite enforces foreign keys per
//!   connection, so every connection from `connect_with_timeout()` enables them
//! - **Immediate transactions**: multi-row writes (move, reorder, subtree
//!   delete) run under `BEGIN IMMEDIATE` so concurrent writers serialize
//!
//! # Database Connection Patterns
//!
//! **ALWAYS use `connect_with_timeout()` in async functions.** It sets a
//! 5-second busy timeout so concurrent writers wait instead of failing with
//! `SQLITE_BUSY`, and it turns on foreign key enforcement.
//!
//! ```no_run
//! # use classifieds_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/classifieds.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use crate::db::node_store::{MoveOutcome, ReorderOutcome};
use crate::models::{NewCategoryField, TreeKind};
use crate::tree::{assign_sort_orders, validate_sibling_order, MAX_TREE_DEPTH};
use libsql::{Builder, Connection, Database, TransactionBehavior};
use std::path::PathBuf;
use std::sync::Arc;

/// Column list shared by every node query (see `TursoStore::row_to_node`)
const NODE_COLUMNS: &str = "id, name, parent_id, sort_order, is_active, created_at, updated_at";

/// Column list shared by every field query (see `TursoStore::row_to_field`)
const FIELD_COLUMNS: &str = "id, category_id, label, field_type, options, is_required, sort_order";

/// Database service for managing the libsql connection and schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` and initialize the schema
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::read_only_location(db_path.clone())
                    } else {
                        DatabaseError::CreateDirectory(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::open(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;
        tracing::info!("Database ready at {}", service.db_path.display());

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements may return rows, so we must use query() instead of execute().
    async fn execute_pragma(&self, conn: &Connection, pragma: &str) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::statement(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::statement(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes (idempotent)
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        for kind in [TreeKind::Category, TreeKind::Location] {
            let table = kind.table_name();
            conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {table} (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        name TEXT NOT NULL,
                        parent_id INTEGER,
                        sort_order INTEGER NOT NULL DEFAULT 0,
                        is_active INTEGER NOT NULL DEFAULT 1,
                        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                        -- Parent deletion cascades to the whole subtree
                        FOREIGN KEY (parent_id) REFERENCES {table}(id) ON DELETE CASCADE
                    )"
                ),
                (),
            )
            .await
            .map_err(|e| DatabaseError::schema(table, e))?;

            conn.execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS idx_{table}_parent ON {table}(parent_id, sort_order)"
                ),
                (),
            )
            .await
            .map_err(|e| DatabaseError::schema(format!("idx_{}_parent", table), e))?;
        }

        conn.execute(
            "CREATE TABLE IF NOT EXISTS category_fields (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_id INTEGER NOT NULL,
                label TEXT NOT NULL,
                field_type TEXT NOT NULL,
                options JSON NOT NULL DEFAULT '[]',
                is_required INTEGER NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
            )",
            (),
        )
        .await
        .map_err(|e| DatabaseError::schema("category_fields", e))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_category_fields_category ON category_fields(category_id, sort_order)",
            (),
        )
        .await
        .map_err(|e| DatabaseError::schema("idx_category_fields_category", e))?;

        Ok(())
    }

    /// Get a raw connection to the database
    ///
    /// **⚠️ WARNING**: the returned connection has neither a busy timeout nor
    /// foreign key enforcement. Use `connect_with_timeout()` for all regular
    /// work.
    pub fn connect(&self) -> Result<Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::Libsql)
    }

    /// Get a connection with busy timeout and foreign keys configured
    pub async fn connect_with_timeout(&self) -> Result<Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    //
    // NODE OPERATIONS
    // Raw SQL for the hierarchy tables. Row conversion happens in TursoStore.
    //

    /// Insert a node, appending it after its last sibling
    ///
    /// Returns the id assigned by the database, or `None` when the parent
    /// already sits at [`MAX_TREE_DEPTH`]. The depth is counted by the same
    /// statement that inserts, so a concurrent move cannot slip in between.
    pub async fn db_insert_node(
        &self,
        kind: TreeKind,
        name: &str,
        parent_id: Option<i64>,
        is_active: bool,
    ) -> Result<Option<i64>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let table = kind.table_name();

        let inserted = conn
            .execute(
                &format!(
                    "WITH RECURSIVE ancestors(id, parent_id) AS (
                        SELECT id, parent_id FROM {table} WHERE id = ?2
                        UNION
                        SELECT t.id, t.parent_id FROM {table} t JOIN ancestors a ON t.id = a.parent_id
                     )
                     INSERT INTO {table} (name, parent_id, sort_order, is_active)
                     SELECT ?1, ?2, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM {table} WHERE parent_id IS ?2), ?3
                     WHERE (SELECT COUNT(*) FROM ancestors) < ?4"
                ),
                (name, parent_id, is_active as i64, MAX_TREE_DEPTH as i64),
            )
            .await
            .map_err(|e| DatabaseError::statement(format!("Failed to insert {}: {}", kind, e)))?;

        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    /// Fetch a single node row by id
    pub async fn db_get_node(
        &self,
        kind: TreeKind,
        id: i64,
    ) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut rows = conn
            .query(
                &format!(
                    "SELECT {NODE_COLUMNS} FROM {} WHERE id = ?1",
                    kind.table_name()
                ),
                [id],
            )
            .await
            .map_err(|e| {
                DatabaseError::statement(format!("Failed to execute get_node query: {}", e))
            })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::statement(e.to_string()))
    }

    /// Fetch every row of a tree
    ///
    /// Rows come back in sibling order; the tree builder does the nesting.
    pub async fn db_list_nodes(&self, kind: TreeKind) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.query(
            &format!(
                "SELECT {NODE_COLUMNS} FROM {} ORDER BY parent_id, sort_order, id",
                kind.table_name()
            ),
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::statement(format!("Failed to execute list_nodes query: {}", e))
        })
    }

    /// Fetch the direct children of `parent_id` (`None` = roots) in sibling order
    pub async fn db_get_children(
        &self,
        kind: TreeKind,
        parent_id: Option<i64>,
    ) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.query(
            &format!(
                "SELECT {NODE_COLUMNS} FROM {} WHERE parent_id IS ?1 ORDER BY sort_order, id",
                kind.table_name()
            ),
            [parent_id],
        )
        .await
        .map_err(|e| {
            DatabaseError::statement(format!("Failed to execute get_children query: {}", e))
        })
    }

    /// Apply a sparse update; `None` fields keep their stored value
    ///
    /// Returns the number of rows affected (0 = node didn't exist).
    pub async fn db_update_node(
        &self,
        kind: TreeKind,
        id: i64,
        name: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            &format!(
                "UPDATE {} SET name = COALESCE(?1, name), is_active = COALESCE(?2, is_active),
                 updated_at = CURRENT_TIMESTAMP WHERE id = ?3",
                kind.table_name()
            ),
            (name, is_active.map(|active| active as i64), id),
        )
        .await
        .map_err(|e| DatabaseError::statement(format!("Failed to update {}: {}", kind, e)))
    }

    /// Delete a node and, through `ON DELETE CASCADE`, its subtree
    ///
    /// Returns the size of the removed subtree (0 = node didn't exist). The
    /// count and the delete run in one transaction.
    pub async fn db_delete_subtree(&self, kind: TreeKind, id: i64) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let table = kind.table_name();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;

        let result: Result<u64, DatabaseError> = async {
            let mut rows = tx
                .query(
                    &format!(
                        "WITH RECURSIVE subtree(id) AS (
                            SELECT id FROM {table} WHERE id = ?1
                            UNION
                            SELECT t.id FROM {table} t JOIN subtree s ON t.parent_id = s.id
                         )
                         SELECT COUNT(*) FROM subtree"
                    ),
                    [id],
                )
                .await?;
            let count: i64 = match rows.next().await? {
                Some(row) => row.get(0)?,
                None => 0,
            };
            drop(rows);

            if count > 0 {
                tx.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])
                    .await?;
            }
            Ok(count as u64)
        }
        .await;

        match result {
            Ok(count) => {
                tx.commit().await?;
                Ok(count)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(DatabaseError::statement(format!(
                    "Failed to delete {} {}: {}",
                    kind, id, e
                )))
            }
        }
    }

    /// Reparent a node, re-checking for cycles inside the write transaction
    ///
    /// The moved node is appended after the last child of its new parent.
    /// Moving a node to its current parent is reported as
    /// [`MoveOutcome::Unchanged`] and writes nothing.
    pub async fn db_move_node(
        &self,
        kind: TreeKind,
        node_id: i64,
        new_parent_id: Option<i64>,
    ) -> Result<MoveOutcome, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;

        match Self::move_within(&tx, kind, node_id, new_parent_id).await {
            Ok(MoveOutcome::Moved) => {
                tx.commit().await?;
                Ok(MoveOutcome::Moved)
            }
            Ok(outcome) => {
                tx.rollback().await?;
                Ok(outcome)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(DatabaseError::statement(format!(
                    "Failed to move {} {}: {}",
                    kind, node_id, e
                )))
            }
        }
    }

    async fn move_within(
        conn: &Connection,
        kind: TreeKind,
        node_id: i64,
        new_parent_id: Option<i64>,
    ) -> Result<MoveOutcome, DatabaseError> {
        let table = kind.table_name();

        let mut rows = conn
            .query(&format!("SELECT parent_id FROM {table} WHERE id = ?1"), [node_id])
            .await?;
        let current_parent: Option<i64> = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => return Ok(MoveOutcome::NodeNotFound),
        };
        drop(rows);

        if current_parent == new_parent_id {
            return Ok(MoveOutcome::Unchanged);
        }

        if let Some(parent_id) = new_parent_id {
            if parent_id == node_id {
                return Ok(MoveOutcome::CycleDetected);
            }

            let mut rows = conn
                .query(&format!("SELECT 1 FROM {table} WHERE id = ?1"), [parent_id])
                .await?;
            if rows.next().await?.is_none() {
                return Ok(MoveOutcome::ParentNotFound);
            }
            drop(rows);
        }

        // Walk up from the new parent; meeting the moved node means a cycle.
        // UNION drops repeated rows, so the walk ends even on a stored cycle.
        let mut rows = conn
            .query(
                &format!(
                    "WITH RECURSIVE ancestors(id, parent_id) AS (
                        SELECT id, parent_id FROM {table} WHERE id = ?1
                        UNION
                        SELECT t.id, t.parent_id FROM {table} t JOIN ancestors a ON t.id = a.parent_id
                     )
                     SELECT COUNT(*), COALESCE(SUM(id = ?2), 0) FROM ancestors"
                ),
                (new_parent_id, node_id),
            )
            .await?;
        let (parent_depth, hits): (i64, i64) = match rows.next().await? {
            Some(row) => (row.get(0)?, row.get(1)?),
            None => (0, 0),
        };
        drop(rows);
        if hits > 0 {
            return Ok(MoveOutcome::CycleDetected);
        }

        // Levels the moved subtree spans, stopping one past the limit
        let mut rows = conn
            .query(
                &format!(
                    "WITH RECURSIVE subtree(id, depth) AS (
                        SELECT id, 1 FROM {table} WHERE id = ?1
                        UNION ALL
                        SELECT t.id, s.depth + 1 FROM {table} t JOIN subtree s ON t.parent_id = s.id
                        WHERE s.depth <= ?2
                     )
                     SELECT COALESCE(MAX(depth), 1) FROM subtree"
                ),
                (node_id, MAX_TREE_DEPTH as i64),
            )
            .await?;
        let height: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 1,
        };
        drop(rows);
        if parent_depth + height > MAX_TREE_DEPTH as i64 {
            return Ok(MoveOutcome::DepthExceeded);
        }

        conn.execute(
            &format!(
                "UPDATE {table} SET parent_id = ?1,
                 sort_order = (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM {table} WHERE parent_id IS ?1 AND id != ?2),
                 updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?2"
            ),
            (new_parent_id, node_id),
        )
        .await?;

        Ok(MoveOutcome::Moved)
    }

    /// Rewrite the sort order of a sibling group in one transaction
    ///
    /// The submitted ids are validated against the sibling set read inside
    /// the transaction; on mismatch nothing is written.
    pub async fn db_reorder_siblings(
        &self,
        kind: TreeKind,
        parent_id: Option<i64>,
        ordered_ids: &[i64],
    ) -> Result<ReorderOutcome, DatabaseError> {
        let table = kind.table_name();
        let scope = ReorderScope {
            table,
            scope_column: "parent_id",
            scope_value: parent_id,
            scope_table: table,
        };
        self.reorder(scope, ordered_ids).await
    }

    /// Rewrite the sort order of a category's custom fields in one transaction
    pub async fn db_reorder_fields(
        &self,
        category_id: i64,
        ordered_ids: &[i64],
    ) -> Result<ReorderOutcome, DatabaseError> {
        let scope = ReorderScope {
            table: "category_fields",
            scope_column: "category_id",
            scope_value: Some(category_id),
            scope_table: TreeKind::Category.table_name(),
        };
        self.reorder(scope, ordered_ids).await
    }

    async fn reorder(
        &self,
        scope: ReorderScope,
        ordered_ids: &[i64],
    ) -> Result<ReorderOutcome, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;

        match Self::reorder_within(&tx, &scope, ordered_ids).await {
            Ok(ReorderOutcome::Reordered) => {
                tx.commit().await?;
                Ok(ReorderOutcome::Reordered)
            }
            Ok(outcome) => {
                tx.rollback().await?;
                Ok(outcome)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(DatabaseError::statement(format!(
                    "Failed to reorder {}: {}",
                    scope.table, e
                )))
            }
        }
    }

    async fn reorder_within(
        conn: &Connection,
        scope: &ReorderScope,
        ordered_ids: &[i64],
    ) -> Result<ReorderOutcome, DatabaseError> {
        if let Some(owner_id) = scope.scope_value {
            let mut rows = conn
                .query(
                    &format!("SELECT 1 FROM {} WHERE id = ?1", scope.scope_table),
                    [owner_id],
                )
                .await?;
            if rows.next().await?.is_none() {
                return Ok(ReorderOutcome::ParentNotFound);
            }
        }

        let mut rows = conn
            .query(
                &format!(
                    "SELECT id FROM {} WHERE {} IS ?1 ORDER BY sort_order, id",
                    scope.table, scope.scope_column
                ),
                [scope.scope_value],
            )
            .await?;
        let mut current = Vec::new();
        while let Some(row) = rows.next().await? {
            current.push(row.get::<i64>(0)?);
        }
        drop(rows);

        if let Err(mismatch) = validate_sibling_order(&current, ordered_ids) {
            return Ok(ReorderOutcome::Mismatch(mismatch));
        }

        let update = format!("UPDATE {} SET sort_order = ?1 WHERE id = ?2", scope.table);
        for (id, position) in assign_sort_orders(ordered_ids) {
            conn.execute(&update, (position, id)).await?;
        }

        Ok(ReorderOutcome::Reordered)
    }

    //
    // CATEGORY FIELD OPERATIONS
    //

    /// Insert a custom field, appending it after the category's last field
    pub async fn db_insert_field(&self, field: &NewCategoryField) -> Result<i64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let options = serde_json::to_string(&field.options)
            .map_err(|e| DatabaseError::statement(format!("Failed to encode options: {}", e)))?;

        conn.execute(
            "INSERT INTO category_fields (category_id, label, field_type, options, is_required, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM category_fields WHERE category_id = ?1))",
            (
                field.category_id,
                field.label.as_str(),
                field.field_type.as_str(),
                options,
                field.is_required as i64,
            ),
        )
        .await
        .map_err(|e| DatabaseError::statement(format!("Failed to insert field: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    /// Fetch a single field row by id
    pub async fn db_get_field(&self, id: i64) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut rows = conn
            .query(
                &format!("SELECT {FIELD_COLUMNS} FROM category_fields WHERE id = ?1"),
                [id],
            )
            .await
            .map_err(|e| {
                DatabaseError::statement(format!("Failed to execute get_field query: {}", e))
            })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::statement(e.to_string()))
    }

    /// Fetch the fields of a category in display order
    pub async fn db_list_fields(&self, category_id: i64) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.query(
            &format!(
                "SELECT {FIELD_COLUMNS} FROM category_fields WHERE category_id = ?1 ORDER BY sort_order, id"
            ),
            [category_id],
        )
        .await
        .map_err(|e| {
            DatabaseError::statement(format!("Failed to execute list_fields query: {}", e))
        })
    }

    /// Delete a field; returns rows affected (0 = field didn't exist)
    pub async fn db_delete_field(&self, id: i64) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("DELETE FROM category_fields WHERE id = ?1", [id])
            .await
            .map_err(|e| DatabaseError::statement(format!("Failed to delete field: {}", e)))
    }
}

/// Which rows a reorder touches: those of `table` whose `scope_column`
/// equals `scope_value`; the owner row must exist in `scope_table`
struct ReorderScope {
    table: &'static str,
    scope_column: &'static str,
    scope_value: Option<i64>,
    scope_table: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_db() -> (DatabaseService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        (db, temp_dir)
    }

    async fn sort_orders(db: &DatabaseService, parent: Option<i64>) -> Vec<(i64, i64)> {
        let mut rows = db
            .db_get_children(TreeKind::Category, parent)
            .await
            .unwrap();
        let mut result = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            result.push((row.get::<i64>(0).unwrap(), row.get::<i64>(3).unwrap()));
        }
        result
    }

    #[tokio::test]
    async fn test_schema_initialization_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("test.db");

        DatabaseService::new(path.clone()).await.unwrap();
        let db = DatabaseService::new(path).await.unwrap();

        let id = db
            .db_insert_node(TreeKind::Location, "Berlin", None, true)
            .await
            .unwrap()
            .unwrap();
        assert!(db.db_get_node(TreeKind::Location, id).await.unwrap().is_some());
        assert!(db.db_get_node(TreeKind::Category, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_appends_to_siblings() {
        let (db, _temp) = create_test_db().await;

        let root = db
            .db_insert_node(TreeKind::Category, "Vehicles", None, true)
            .await
            .unwrap()
            .unwrap();
        let a = db
            .db_insert_node(TreeKind::Category, "Cars", Some(root), true)
            .await
            .unwrap()
            .unwrap();
        let b = db
            .db_insert_node(TreeKind::Category, "Bikes", Some(root), true)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sort_orders(&db, Some(root)).await, vec![(a, 0), (b, 1)]);
        assert_eq!(sort_orders(&db, None).await, vec![(root, 0)]);
    }

    #[tokio::test]
    async fn test_insert_under_missing_parent_fails() {
        let (db, _temp) = create_test_db().await;

        let result = db
            .db_insert_node(TreeKind::Category, "Ghost", Some(404), true)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_move_rechecks_cycles_in_transaction() {
        let (db, _temp) = create_test_db().await;

        let a = db.db_insert_node(TreeKind::Category, "A", None, true).await.unwrap().unwrap();
        let b = db.db_insert_node(TreeKind::Category, "B", Some(a), true).await.unwrap().unwrap();
        let c = db.db_insert_node(TreeKind::Category, "C", Some(b), true).await.unwrap().unwrap();

        assert_eq!(
            db.db_move_node(TreeKind::Category, a, Some(c)).await.unwrap(),
            MoveOutcome::CycleDetected
        );
        assert_eq!(
            db.db_move_node(TreeKind::Category, a, Some(a)).await.unwrap(),
            MoveOutcome::CycleDetected
        );
        assert_eq!(
            db.db_move_node(TreeKind::Category, 999, None).await.unwrap(),
            MoveOutcome::NodeNotFound
        );
        assert_eq!(
            db.db_move_node(TreeKind::Category, c, Some(999)).await.unwrap(),
            MoveOutcome::ParentNotFound
        );
        assert_eq!(
            db.db_move_node(TreeKind::Category, c, Some(b)).await.unwrap(),
            MoveOutcome::Unchanged
        );
        assert_eq!(
            db.db_move_node(TreeKind::Category, c, Some(a)).await.unwrap(),
            MoveOutcome::Moved
        );
        assert_eq!(sort_orders(&db, Some(a)).await, vec![(b, 0), (c, 1)]);
    }

    /// Insert a single chain `MAX_TREE_DEPTH` levels deep, root first
    async fn insert_full_depth_chain(db: &DatabaseService) -> Vec<i64> {
        let mut chain = Vec::with_capacity(MAX_TREE_DEPTH);
        let mut parent = None;
        for level in 1..=MAX_TREE_DEPTH {
            let id = db
                .db_insert_node(TreeKind::Category, &format!("level-{}", level), parent, true)
                .await
                .unwrap()
                .unwrap();
            chain.push(id);
            parent = Some(id);
        }
        chain
    }

    #[tokio::test]
    async fn test_insert_stops_at_depth_limit() {
        let (db, _temp) = create_test_db().await;
        let chain = insert_full_depth_chain(&db).await;
        let deepest = *chain.last().unwrap();

        let refused = db
            .db_insert_node(TreeKind::Category, "too deep", Some(deepest), true)
            .await
            .unwrap();
        assert_eq!(refused, None);
        assert!(sort_orders(&db, Some(deepest)).await.is_empty());

        // One level up still has room
        let sibling = db
            .db_insert_node(TreeKind::Category, "sibling", Some(chain[chain.len() - 2]), true)
            .await
            .unwrap();
        assert!(sibling.is_some());
    }

    #[tokio::test]
    async fn test_move_cycle_check_covers_full_depth() {
        let (db, _temp) = create_test_db().await;
        let chain = insert_full_depth_chain(&db).await;
        let root = chain[0];
        let deepest = *chain.last().unwrap();

        assert_eq!(
            db.db_move_node(TreeKind::Category, root, Some(deepest))
                .await
                .unwrap(),
            MoveOutcome::CycleDetected
        );
        assert_eq!(sort_orders(&db, None).await, vec![(root, 0)]);
    }

    #[tokio::test]
    async fn test_move_rejects_subtree_below_depth_limit() {
        let (db, _temp) = create_test_db().await;
        let chain = insert_full_depth_chain(&db).await;

        let top = db.db_insert_node(TreeKind::Category, "Top", None, true).await.unwrap().unwrap();
        let leaf = db.db_insert_node(TreeKind::Category, "Leaf", Some(top), true).await.unwrap().unwrap();

        // Two levels under level MAX - 1 reach MAX + 1
        assert_eq!(
            db.db_move_node(TreeKind::Category, top, Some(chain[chain.len() - 2]))
                .await
                .unwrap(),
            MoveOutcome::DepthExceeded
        );
        // A single node fits exactly at MAX
        assert_eq!(
            db.db_move_node(TreeKind::Category, leaf, Some(chain[chain.len() - 2]))
                .await
                .unwrap(),
            MoveOutcome::Moved
        );
        assert_eq!(
            db.db_move_node(TreeKind::Category, top, Some(*chain.last().unwrap()))
                .await
                .unwrap(),
            MoveOutcome::DepthExceeded
        );
    }

    #[tokio::test]
    async fn test_reorder_mismatch_writes_nothing() {
        let (db, _temp) = create_test_db().await;

        let a = db.db_insert_node(TreeKind::Category, "A", None, true).await.unwrap().unwrap();
        let b = db.db_insert_node(TreeKind::Category, "B", None, true).await.unwrap().unwrap();
        let c = db.db_insert_node(TreeKind::Category, "C", None, true).await.unwrap().unwrap();
        let before = sort_orders(&db, None).await;

        let outcome = db
            .db_reorder_siblings(TreeKind::Category, None, &[c, a])
            .await
            .unwrap();
        match outcome {
            ReorderOutcome::Mismatch(mismatch) => assert_eq!(mismatch.missing, vec![b]),
            other => panic!("expected mismatch, got {:?}", other),
        }
        assert_eq!(sort_orders(&db, None).await, before);

        let outcome = db
            .db_reorder_siblings(TreeKind::Category, None, &[c, a, b])
            .await
            .unwrap();
        assert_eq!(outcome, ReorderOutcome::Reordered);
        assert_eq!(sort_orders(&db, None).await, vec![(c, 0), (a, 1), (b, 2)]);
    }

    #[tokio::test]
    async fn test_delete_subtree_counts_descendants() {
        let (db, _temp) = create_test_db().await;

        let a = db.db_insert_node(TreeKind::Category, "A", None, true).await.unwrap().unwrap();
        let b = db.db_insert_node(TreeKind::Category, "B", Some(a), true).await.unwrap().unwrap();
        let c = db.db_insert_node(TreeKind::Category, "C", Some(b), true).await.unwrap().unwrap();

        assert_eq!(db.db_delete_subtree(TreeKind::Category, a).await.unwrap(), 3);
        assert!(db.db_get_node(TreeKind::Category, b).await.unwrap().is_none());
        assert!(db.db_get_node(TreeKind::Category, c).await.unwrap().is_none());
        assert_eq!(db.db_delete_subtree(TreeKind::Category, a).await.unwrap(), 0);
    }
}
