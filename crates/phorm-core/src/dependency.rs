//! Dependency records -- rules linking a source (form, field) to a target
//! (form, field) with an evaluation kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::DependencyKind;

/// Builds the graph node key for a (form, field) pair.
pub fn field_key(form_id: &str, field_id: &str) -> String {
    format!("{form_id}.{field_id}")
}

/// A stored rule linking a source field to a target field across forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDependency {
    #[serde(default)]
    pub id: String,

    pub source_form_id: String,
    pub source_field_id: String,
    pub target_form_id: String,
    pub target_field_id: String,

    #[serde(default)]
    pub kind: DependencyKind,

    /// Formula for calculation, condition for visibility, rule for
    /// validation. Empty for value/lookup kinds.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expression: String,

    /// Lookup table key for lookup dependencies.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lookup_key: String,

    /// Human-readable description, used as the validation failure message.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Evaluation priority within one processing pass, ascending.
    #[serde(default)]
    pub execution_order: i32,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_by: String,
}

fn default_active() -> bool {
    true
}

impl FormDependency {
    /// Creates an active dependency with a fresh id and order 0.
    pub fn new(
        kind: DependencyKind,
        source_form_id: impl Into<String>,
        source_field_id: impl Into<String>,
        target_form_id: impl Into<String>,
        target_field_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_form_id: source_form_id.into(),
            source_field_id: source_field_id.into(),
            target_form_id: target_form_id.into(),
            target_field_id: target_field_id.into(),
            kind,
            expression: String::new(),
            lookup_key: String::new(),
            description: String::new(),
            execution_order: 0,
            is_active: true,
            created_at: Utc::now(),
            created_by: String::new(),
            updated_at: None,
            updated_by: String::new(),
        }
    }

    #[must_use]
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = expression.into();
        self
    }

    #[must_use]
    pub fn with_lookup_key(mut self, key: impl Into<String>) -> Self {
        self.lookup_key = key.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.execution_order = order;
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Graph node key of the source endpoint.
    pub fn source_key(&self) -> String {
        field_key(&self.source_form_id, &self.source_field_id)
    }

    /// Graph node key of the target endpoint.
    pub fn target_key(&self) -> String {
        field_key(&self.target_form_id, &self.target_field_id)
    }

    /// Returns `true` if the dependency touches the given form on either side.
    pub fn touches_form(&self, form_id: &str) -> bool {
        self.source_form_id == form_id || self.target_form_id == form_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_join_form_and_field() {
        let dep = FormDependency::new(DependencyKind::Value, "a", "f1", "b", "f2");
        assert_eq!(dep.source_key(), "a.f1");
        assert_eq!(dep.target_key(), "b.f2");
        assert!(dep.touches_form("a"));
        assert!(dep.touches_form("b"));
        assert!(!dep.touches_form("c"));
    }

    #[test]
    fn serde_round_trip() {
        let dep = FormDependency::new(DependencyKind::Calculation, "a", "qty", "b", "total")
            .with_expression("a.qty * b.price")
            .with_order(5);
        let json = serde_json::to_string(&dep).unwrap();
        assert!(json.contains(r#""kind":"calculation""#));
        let back: FormDependency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dep);
    }

    #[test]
    fn defaults_apply_on_sparse_json() {
        let dep: FormDependency = serde_json::from_str(
            r#"{"source_form_id": "a", "source_field_id": "f1",
                "target_form_id": "b", "target_field_id": "f2"}"#,
        )
        .unwrap();
        assert!(dep.is_active);
        assert_eq!(dep.kind, DependencyKind::Value);
        assert_eq!(dep.execution_order, 0);
    }
}
