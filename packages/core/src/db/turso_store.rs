//! TursoStore - NodeStore implementation backed by libsql
//!
//! Thin wrappers that delegate to `DatabaseService` for SQL and convert
//! `libsql::Row`s into models. Rows are converted while iterating since
//! libsql rows are streamed from the connection.

use crate::db::database::DatabaseService;
use crate::db::node_store::{FieldStore, MoveOutcome, NodeStore, ReorderOutcome};
use crate::models::{
    CategoryField, FieldType, NewCategoryField, NewNode, Node, NodeUpdate, TreeKind,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::{Row, Rows};
use std::sync::Arc;

/// libsql-backed store for one hierarchy table
pub struct TursoStore {
    db: Arc<DatabaseService>,
    kind: TreeKind,
}

impl TursoStore {
    pub fn new(db: Arc<DatabaseService>, kind: TreeKind) -> Self {
        Self { db, kind }
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// `CURRENT_TIMESTAMP` produces "YYYY-MM-DD HH:MM:SS"; rows written by
    /// other tools may carry RFC3339.
    pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as SQLite or RFC3339 format",
            s
        ))
    }

    /// Convert libsql::Row to Node model
    ///
    /// # Row Format
    ///
    /// Expected columns (in order):
    /// - id (INTEGER)
    /// - name (TEXT)
    /// - parent_id (INTEGER, nullable)
    /// - sort_order (INTEGER)
    /// - is_active (INTEGER, 0/1)
    /// - created_at (TEXT)
    /// - updated_at (TEXT)
    fn row_to_node(row: &Row) -> Result<Node> {
        let id: i64 = row.get(0).context("Failed to get id")?;
        let name: String = row.get(1).context("Failed to get name")?;
        let parent_id: Option<i64> = row.get(2).context("Failed to get parent_id")?;
        let sort_order: i64 = row.get(3).context("Failed to get sort_order")?;
        let is_active: i64 = row.get(4).context("Failed to get is_active")?;
        let created_at_str: String = row.get(5).context("Failed to get created_at")?;
        let updated_at_str: String = row.get(6).context("Failed to get updated_at")?;

        Ok(Node {
            id,
            name,
            parent_id,
            sort_order,
            is_active: is_active != 0,
            created_at: Self::parse_timestamp(&created_at_str)
                .context("Failed to parse created_at")?,
            updated_at: Self::parse_timestamp(&updated_at_str)
                .context("Failed to parse updated_at")?,
            children: Vec::new(),
        })
    }

    async fn collect_nodes(mut rows: Rows) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await? {
            nodes.push(Self::row_to_node(&row)?);
        }
        Ok(nodes)
    }
}

#[async_trait]
impl NodeStore for TursoStore {
    fn kind(&self) -> TreeKind {
        self.kind
    }

    async fn create_node(&self, node: NewNode) -> Result<Option<Node>> {
        let Some(id) = self
            .db
            .db_insert_node(self.kind, &node.name, node.parent_id, node.is_active)
            .await?
        else {
            tracing::debug!(
                "create_node: {:?} is at the depth limit of the {} tree",
                node.parent_id,
                self.kind
            );
            return Ok(None);
        };

        let created = self
            .get_node(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("{} {} vanished after insert", self.kind, id))?;
        Ok(Some(created))
    }

    async fn get_node(&self, id: i64) -> Result<Option<Node>> {
        match self.db.db_get_node(self.kind, id).await? {
            Some(row) => Ok(Some(Self::row_to_node(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        tracing::debug!("list_nodes: loading {} tree", self.kind);
        let rows = self.db.db_list_nodes(self.kind).await?;
        Self::collect_nodes(rows).await
    }

    async fn get_children(&self, parent_id: Option<i64>) -> Result<Vec<Node>> {
        let rows = self.db.db_get_children(self.kind, parent_id).await?;
        Self::collect_nodes(rows).await
    }

    async fn update_node(&self, id: i64, update: NodeUpdate) -> Result<Option<Node>> {
        let affected = self
            .db
            .db_update_node(self.kind, id, update.name.as_deref(), update.is_active)
            .await?;

        if affected == 0 {
            return Ok(None);
        }
        self.get_node(id).await
    }

    async fn delete_subtree(&self, id: i64) -> Result<usize> {
        tracing::debug!("delete_subtree: {} {}", self.kind, id);
        let count = self.db.db_delete_subtree(self.kind, id).await?;
        Ok(count as usize)
    }

    async fn move_node(&self, id: i64, new_parent_id: Option<i64>) -> Result<MoveOutcome> {
        let outcome = self.db.db_move_node(self.kind, id, new_parent_id).await?;
        tracing::debug!(
            "move_node: {} {} -> {:?}: {:?}",
            self.kind,
            id,
            new_parent_id,
            outcome
        );
        Ok(outcome)
    }

    async fn reorder_siblings(
        &self,
        parent_id: Option<i64>,
        ordered_ids: Vec<i64>,
    ) -> Result<ReorderOutcome> {
        tracing::debug!(
            "reorder_siblings: {} children of {:?} -> {:?}",
            self.kind,
            parent_id,
            ordered_ids
        );
        Ok(self
            .db
            .db_reorder_siblings(self.kind, parent_id, &ordered_ids)
            .await?)
    }
}

/// libsql-backed store for category custom fields
pub struct TursoFieldStore {
    db: Arc<DatabaseService>,
}

impl TursoFieldStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Columns: id, category_id, label, field_type, options (JSON), is_required, sort_order
    fn row_to_field(row: &Row) -> Result<CategoryField> {
        let field_type: String = row.get(3).context("Failed to get field_type")?;
        let options_json: String = row.get(4).context("Failed to get options")?;
        let is_required: i64 = row.get(5).context("Failed to get is_required")?;

        Ok(CategoryField {
            id: row.get(0).context("Failed to get id")?,
            category_id: row.get(1).context("Failed to get category_id")?,
            label: row.get(2).context("Failed to get label")?,
            field_type: FieldType::parse(&field_type)
                .ok_or_else(|| anyhow::anyhow!("Unknown field type '{}'", field_type))?,
            options: serde_json::from_str(&options_json)
                .context("Failed to parse options JSON")?,
            is_required: is_required != 0,
            sort_order: row.get(6).context("Failed to get sort_order")?,
        })
    }
}

#[async_trait]
impl FieldStore for TursoFieldStore {
    async fn create_field(&self, field: NewCategoryField) -> Result<CategoryField> {
        let id = self.db.db_insert_field(&field).await?;
        self.get_field(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("field {} vanished after insert", id))
    }

    async fn get_field(&self, id: i64) -> Result<Option<CategoryField>> {
        match self.db.db_get_field(id).await? {
            Some(row) => Ok(Some(Self::row_to_field(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_fields(&self, category_id: i64) -> Result<Vec<CategoryField>> {
        let mut rows = self.db.db_list_fields(category_id).await?;
        let mut fields = Vec::new();
        while let Some(row) = rows.next().await? {
            fields.push(Self::row_to_field(&row)?);
        }
        Ok(fields)
    }

    async fn delete_field(&self, id: i64) -> Result<bool> {
        Ok(self.db.db_delete_field(id).await? > 0)
    }

    async fn reorder_fields(
        &self,
        category_id: i64,
        ordered_ids: Vec<i64>,
    ) -> Result<ReorderOutcome> {
        Ok(self.db.db_reorder_fields(category_id, &ordered_ids).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_store(kind: TreeKind) -> (TursoStore, Arc<DatabaseService>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            DatabaseService::new(temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );
        (TursoStore::new(db.clone(), kind), db, temp_dir)
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let sqlite = TursoStore::parse_timestamp("2024-03-01 12:30:00").unwrap();
        let rfc = TursoStore::parse_timestamp("2024-03-01T12:30:00Z").unwrap();
        assert_eq!(sqlite, rfc);
        assert!(TursoStore::parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_create_and_get_node() {
        let (store, _db, _temp) = create_store(TreeKind::Location).await;

        let germany = store
            .create_node(NewNode::new("Germany", None))
            .await
            .unwrap()
            .unwrap();
        let berlin = store
            .create_node(NewNode::new("Berlin", Some(germany.id)))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(berlin.parent_id, Some(germany.id));
        assert_eq!(berlin.sort_order, 0);
        assert!(berlin.is_active);

        let fetched = store.get_node(berlin.id).await.unwrap().unwrap();
        assert_eq!(fetched, berlin);
        assert!(store.get_node(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_is_sparse() {
        let (store, _db, _temp) = create_store(TreeKind::Category).await;
        let node = store
            .create_node(NewNode::new("Cars", None))
            .await
            .unwrap()
            .unwrap();

        let updated = store
            .update_node(
                node.id,
                NodeUpdate {
                    name: None,
                    is_active: Some(false),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Cars");
        assert!(!updated.is_active);

        assert!(store
            .update_node(4242, NodeUpdate::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_trees_are_isolated() {
        let (categories, db, _temp) = create_store(TreeKind::Category).await;
        let locations = TursoStore::new(db, TreeKind::Location);

        categories.create_node(NewNode::new("Jobs", None)).await.unwrap();
        assert_eq!(categories.list_nodes().await.unwrap().len(), 1);
        assert!(locations.list_nodes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_field_store_round_trip() {
        let (categories, db, _temp) = create_store(TreeKind::Category).await;
        let fields = TursoFieldStore::new(db);
        let cars = categories
            .create_node(NewNode::new("Cars", None))
            .await
            .unwrap()
            .unwrap();

        let fuel = fields
            .create_field(NewCategoryField {
                category_id: cars.id,
                label: "Fuel".to_string(),
                field_type: FieldType::Select,
                options: vec!["Petrol".to_string(), "Diesel".to_string()],
                is_required: true,
            })
            .await
            .unwrap();
        let mileage = fields
            .create_field(NewCategoryField {
                category_id: cars.id,
                label: "Mileage".to_string(),
                field_type: FieldType::Number,
                options: Vec::new(),
                is_required: false,
            })
            .await
            .unwrap();

        assert_eq!(fuel.options, vec!["Petrol", "Diesel"]);
        assert_eq!((fuel.sort_order, mileage.sort_order), (0, 1));

        let outcome = fields
            .reorder_fields(cars.id, vec![mileage.id, fuel.id])
            .await
            .unwrap();
        assert_eq!(outcome, ReorderOutcome::Reordered);
        let listed: Vec<i64> = fields
            .list_fields(cars.id)
            .await
            .unwrap()
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(listed, vec![mileage.id, fuel.id]);

        // Category deletion cascades to its fields
        categories.delete_subtree(cars.id).await.unwrap();
        assert!(fields.get_field(fuel.id).await.unwrap().is_none());
    }
}
