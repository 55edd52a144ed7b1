//! Custom form fields attached to categories
//!
//! Listings posted into a category collect the extra attributes defined by
//! that category's fields (mileage for cars, room count for flats, ...).

use super::node::{validate_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Input widget type of a custom field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Text,
    Number,
    Select,
    Checkbox,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::Checkbox => "checkbox",
        }
    }

    pub fn parse(value: &str) -> Option<FieldType> {
        match value {
            "text" => Some(FieldType::Text),
            "number" => Some(FieldType::Number),
            "select" => Some(FieldType::Select),
            "checkbox" => Some(FieldType::Checkbox),
            _ => None,
        }
    }
}

/// A custom field belonging to one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryField {
    pub id: i64,
    pub category_id: i64,
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Vec<String>,
    pub is_required: bool,
    pub sort_order: i64,
}

/// Payload for creating a custom field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategoryField {
    pub category_id: i64,
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub is_required: bool,
}

impl NewCategoryField {
    /// Validate and normalize the payload
    ///
    /// Select fields need at least one option; other types take none.
    /// Labels and options follow the node name length limit.
    pub fn validate(&self) -> Result<NewCategoryField, ValidationError> {
        let label = validate_text("label", &self.label)?;

        let options = self
            .options
            .iter()
            .filter(|o| !o.trim().is_empty())
            .map(|o| validate_text("option", o))
            .collect::<Result<Vec<_>, _>>()?;

        match self.field_type {
            FieldType::Select if options.is_empty() => {
                return Err(ValidationError::InvalidField(
                    "select fields need at least one option".to_string(),
                ));
            }
            FieldType::Select => {}
            _ if !options.is_empty() => {
                return Err(ValidationError::InvalidField(format!(
                    "{} fields do not take options",
                    self.field_type.as_str()
                )));
            }
            _ => {}
        }

        Ok(NewCategoryField {
            label,
            options,
            ..self.clone()
        })
    }
}
