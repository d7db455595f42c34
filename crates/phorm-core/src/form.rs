//! Form definition -- the structure of a form: sections containing fields.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::FieldType;

/// A form definition with its sections and fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDefinition {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub is_published: bool,

    /// Text direction; the original deployment targeted Arabic, so RTL is
    /// the default.
    #[serde(default = "default_direction")]
    pub direction: String,

    #[serde(default)]
    pub sections: Vec<FormSection>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_by: String,
}

fn default_version() -> String {
    "1.0".to_owned()
}

fn default_direction() -> String {
    "rtl".to_owned()
}

impl FormDefinition {
    /// Creates an empty form with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            version: default_version(),
            is_published: false,
            direction: default_direction(),
            sections: Vec::new(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
            created_by: String::new(),
            updated_at: None,
            updated_by: String::new(),
        }
    }

    /// Returns `true` if any section contains a field with this id.
    pub fn has_field(&self, field_id: &str) -> bool {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .any(|f| f.id == field_id)
    }

    /// Looks up a field across all sections.
    pub fn field(&self, field_id: &str) -> Option<&FormField> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .find(|f| f.id == field_id)
    }

    /// Iterates over all fields in section order.
    pub fn all_fields(&self) -> impl Iterator<Item = &FormField> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }
}

/// A titled group of fields within a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSection {
    #[serde(default)]
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub order: i32,

    #[serde(default)]
    pub is_collapsible: bool,

    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// A single input field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,

    pub label: String,

    #[serde(default, rename = "type")]
    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub placeholder: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help_text: String,

    #[serde(default)]
    pub is_required: bool,

    #[serde(default)]
    pub is_read_only: bool,

    #[serde(default)]
    pub is_hidden: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_value: String,

    #[serde(default)]
    pub order: i32,

    /// Options for select/radio/checkbox fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
}

/// One choice of a select/radio/checkbox field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> FormDefinition {
        let mut form = FormDefinition::new("Product Registration");
        form.sections.push(FormSection {
            id: "main".into(),
            title: "Main".into(),
            description: String::new(),
            order: 0,
            is_collapsible: false,
            fields: vec![
                FormField {
                    id: "product_name".into(),
                    label: "Product name".into(),
                    field_type: FieldType::Text,
                    placeholder: String::new(),
                    help_text: String::new(),
                    is_required: true,
                    is_read_only: false,
                    is_hidden: false,
                    default_value: String::new(),
                    order: 0,
                    options: vec![],
                },
                FormField {
                    id: "qty".into(),
                    label: "Quantity".into(),
                    field_type: FieldType::Number,
                    placeholder: String::new(),
                    help_text: String::new(),
                    is_required: false,
                    is_read_only: false,
                    is_hidden: false,
                    default_value: String::new(),
                    order: 1,
                    options: vec![],
                },
            ],
        });
        form
    }

    #[test]
    fn has_field_searches_all_sections() {
        let form = sample_form();
        assert!(form.has_field("qty"));
        assert!(!form.has_field("missing"));
    }

    #[test]
    fn serde_round_trip() {
        let form = sample_form();
        let json = serde_json::to_string(&form).unwrap();
        let back: FormDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "Product Registration");
        assert_eq!(back.sections.len(), 1);
        assert_eq!(back.sections[0].fields[1].field_type, FieldType::Number);
    }

    #[test]
    fn minimal_json_applies_defaults() {
        let form: FormDefinition =
            serde_json::from_str(r#"{"id": "f1", "name": "Minimal"}"#).unwrap();
        assert_eq!(form.version, "1.0");
        assert_eq!(form.direction, "rtl");
        assert!(form.sections.is_empty());
    }
}
