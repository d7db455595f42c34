//! Lookup provider seam for lookup dependencies.
//!
//! The engine and the live mirror both consume this trait rather than a
//! concrete backend, so lookup resolution can be anything from a static
//! table to a remote catalog service.

use std::collections::HashMap;

use crate::value::FieldValue;

/// Errors from a lookup backend.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The backend could not be reached or answered with a failure.
    #[error("lookup backend unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a (lookup key, source value) pair to a replacement value.
///
/// `Ok(None)` means the pair did not resolve, which callers currently treat
/// the same as an unavailable backend: the source value passes through
/// unchanged. The distinction is preserved in the signature so a stricter
/// policy can be adopted without changing implementors.
pub trait LookupProvider: Send + Sync {
    fn resolve(&self, key: &str, value: &FieldValue) -> Result<Option<FieldValue>, LookupError>;
}

/// In-memory lookup tables, keyed by lookup key then by the source value's
/// canonical string form.
#[derive(Debug, Default)]
pub struct TableLookup {
    tables: HashMap<String, HashMap<String, FieldValue>>,
}

impl TableLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one (key, source value, resolved value) entry.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        source: impl Into<String>,
        resolved: impl Into<FieldValue>,
    ) {
        self.tables
            .entry(key.into())
            .or_default()
            .insert(source.into(), resolved.into());
    }
}

impl LookupProvider for TableLookup {
    fn resolve(&self, key: &str, value: &FieldValue) -> Result<Option<FieldValue>, LookupError> {
        Ok(self
            .tables
            .get(key)
            .and_then(|table| table.get(&value.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup_resolves_by_string_form() {
        let mut lookup = TableLookup::new();
        lookup.insert("atc_codes", "aspirin", "N02BA01");

        let hit = lookup
            .resolve("atc_codes", &FieldValue::Text("aspirin".into()))
            .unwrap();
        assert_eq!(hit, Some(FieldValue::Text("N02BA01".into())));

        let miss = lookup
            .resolve("atc_codes", &FieldValue::Text("unknown".into()))
            .unwrap();
        assert_eq!(miss, None);

        let missing_table = lookup.resolve("nope", &FieldValue::Int(1)).unwrap();
        assert_eq!(missing_table, None);
    }
}
