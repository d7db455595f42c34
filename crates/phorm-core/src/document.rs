//! Form document -- the field locator over one form's data.
//!
//! A [`FormDocument`] is never mutated in place: [`FormDocument::set`]
//! returns a new document, so a processing pass can roll back by dropping
//! its working copy. Several engine invariants (idempotence, rollback
//! safety) depend on this contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::value::FieldValue;

/// The current set of field values for one form instance.
///
/// Fields are kept in a `BTreeMap` so iteration order is deterministic
/// regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormDocument {
    fields: BTreeMap<String, FieldValue>,
}

impl FormDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from a JSON value. Non-object values yield an
    /// empty document; top-level properties are normalized through
    /// [`FieldValue::from_json`].
    pub fn from_json_value(value: &Value) -> Self {
        let mut fields = BTreeMap::new();
        if let Value::Object(map) = value {
            for (k, v) in map {
                fields.insert(k.clone(), FieldValue::from_json(v));
            }
        }
        Self { fields }
    }

    /// Parses a JSON string into a document.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_json_value(&value))
    }

    /// Looks up a top-level field. A missing field is a signal, not an
    /// error -- callers decide whether that is fatal.
    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.fields.get(field_id)
    }

    /// Returns a new document with the field added or overwritten. The
    /// receiver is left untouched.
    #[must_use]
    pub fn set(&self, field_id: &str, value: FieldValue) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(field_id.to_owned(), value);
        Self { fields }
    }

    /// Chainable variant of [`set`](Self::set) for building documents.
    #[must_use]
    pub fn with_field(self, field_id: &str, value: impl Into<FieldValue>) -> Self {
        let mut fields = self.fields;
        fields.insert(field_id.to_owned(), value.into());
        Self { fields }
    }

    pub fn contains_field(&self, field_id: &str) -> bool {
        self.fields.contains_key(field_id)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serializes back to a JSON object.
    pub fn to_json_value(&self) -> Value {
        let map = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

impl Serialize for FormDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FormDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json_value(&value))
    }
}
