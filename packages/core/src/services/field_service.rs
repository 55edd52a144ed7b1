//! Category custom field management
//!
//! Fields belong to a single category and are kept in an explicit display
//! order, reordered with the same exact-set rule as tree siblings.

use crate::auth::{authorize, AuthContext, Operation};
use crate::db::{FieldStore, NodeStore, ReorderOutcome};
use crate::models::{CategoryField, NewCategoryField, TreeKind};
use crate::services::error::TreeServiceError;
use crate::services::tree_service::TreeResult;
use std::sync::Arc;

#[derive(Clone)]
pub struct CategoryFieldService {
    fields: Arc<dyn FieldStore>,
    categories: Arc<dyn NodeStore>,
}

impl CategoryFieldService {
    /// `categories` must be the category store; it is used to check owners
    pub fn new(fields: Arc<dyn FieldStore>, categories: Arc<dyn NodeStore>) -> Self {
        debug_assert_eq!(categories.kind(), TreeKind::Category);
        Self { fields, categories }
    }

    async fn require_category(&self, category_id: i64) -> TreeResult<()> {
        match self.categories.get_node(category_id).await? {
            Some(_) => Ok(()),
            None => Err(TreeServiceError::not_found(TreeKind::Category, category_id)),
        }
    }

    pub async fn list_fields(
        &self,
        ctx: &AuthContext,
        category_id: i64,
    ) -> TreeResult<Vec<CategoryField>> {
        authorize(ctx, Operation::Read)?;
        self.require_category(category_id).await?;
        Ok(self.fields.list_fields(category_id).await?)
    }

    pub async fn create_field(
        &self,
        ctx: &AuthContext,
        field: NewCategoryField,
    ) -> TreeResult<CategoryField> {
        authorize(ctx, Operation::Create)?;
        let field = field.validate()?;
        self.require_category(field.category_id).await?;

        let created = self.fields.create_field(field).await?;
        tracing::info!(
            "Created {} field {} '{}' on category {}",
            created.field_type.as_str(),
            created.id,
            created.label,
            created.category_id
        );
        Ok(created)
    }

    pub async fn delete_field(&self, ctx: &AuthContext, id: i64) -> TreeResult<()> {
        authorize(ctx, Operation::Delete)?;

        if !self.fields.delete_field(id).await? {
            return Err(TreeServiceError::field_not_found(id));
        }
        tracing::info!("Deleted field {}", id);
        Ok(())
    }

    /// Replace the display order of a category's fields
    pub async fn reorder_fields(
        &self,
        ctx: &AuthContext,
        category_id: i64,
        ordered_ids: Vec<i64>,
    ) -> TreeResult<()> {
        authorize(ctx, Operation::Reorder)?;

        match self.fields.reorder_fields(category_id, ordered_ids).await? {
            ReorderOutcome::Reordered => {
                tracing::info!("Reordered fields of category {}", category_id);
                Ok(())
            }
            ReorderOutcome::Mismatch(mismatch) => Err(mismatch.into()),
            ReorderOutcome::ParentNotFound => {
                Err(TreeServiceError::not_found(TreeKind::Category, category_id))
            }
        }
    }
}
