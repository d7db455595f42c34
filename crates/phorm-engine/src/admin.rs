//! Dependency administration: the full gate a record passes before it is
//! persisted.
//!
//! Three layers run in order: record validation (endpoints present,
//! expression/lookup key where the kind needs them), referential checks
//! (both forms exist and define the named fields), and the acyclicity
//! pre-check. The store repeats the cycle check under its connection lock,
//! so the pre-check here exists for a better error before any write is
//! attempted.

use tracing::info;

use phorm_core::dependency::FormDependency;
use phorm_core::graph;
use phorm_core::validation::validate_dependency;
use phorm_storage::{FormStore, StorageError};

use crate::error::{EngineError, Result};
use crate::processor::DependencyEngine;

impl<S: FormStore> DependencyEngine<S> {
    /// Validates and persists a new dependency.
    pub fn create_dependency(&self, dep: &FormDependency) -> Result<()> {
        self.check_record(dep)?;
        self.store.create_dependency(dep).map_err(map_cycle)?;
        info!(
            dependency = %dep.id,
            kind = %dep.kind,
            source = %dep.source_key(),
            target = %dep.target_key(),
            "dependency created"
        );
        Ok(())
    }

    /// Validates and persists changes to an existing dependency.
    pub fn update_dependency(&self, dep: &FormDependency) -> Result<()> {
        self.check_record(dep)?;
        self.store.update_dependency(dep).map_err(map_cycle)?;
        info!(dependency = %dep.id, "dependency updated");
        Ok(())
    }

    pub fn delete_dependency(&self, id: &str) -> Result<()> {
        self.store.delete_dependency(id)?;
        info!(dependency = %id, "dependency deleted");
        Ok(())
    }

    /// All dependencies touching `form_id`, in execution order.
    pub fn dependencies_for_form(&self, form_id: &str) -> Result<Vec<FormDependency>> {
        Ok(self.store.dependencies_for_form(form_id)?)
    }

    /// Dry-run of the cycle guard, for interactive checks before a save.
    pub fn would_create_cycle(&self, candidate: &FormDependency) -> Result<bool> {
        let existing = self.store.active_dependencies()?;
        Ok(graph::would_create_cycle(&existing, candidate))
    }

    fn check_record(&self, dep: &FormDependency) -> Result<()> {
        validate_dependency(dep)?;
        self.check_endpoint(&dep.source_form_id, &dep.source_field_id)?;
        self.check_endpoint(&dep.target_form_id, &dep.target_field_id)?;
        if self.would_create_cycle(dep)? {
            return Err(EngineError::CycleDetected);
        }
        Ok(())
    }

    fn check_endpoint(&self, form_id: &str, field_id: &str) -> Result<()> {
        let form = self.store.get_form(form_id).map_err(|e| {
            if e.is_not_found() {
                EngineError::unknown_form(form_id)
            } else {
                e.into()
            }
        })?;
        if !form.has_field(field_id) {
            return Err(EngineError::unknown_field(form_id, field_id));
        }
        Ok(())
    }
}

/// The store re-runs the cycle guard under its lock; surface that outcome
/// as the engine's own cycle error rather than a storage failure.
fn map_cycle(e: StorageError) -> EngineError {
    match e {
        StorageError::CycleDetected => EngineError::CycleDetected,
        other => EngineError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use phorm_core::enums::{DependencyKind, FieldType};
    use phorm_core::form::{FormDefinition, FormField, FormSection};
    use phorm_storage::SqliteStore;

    fn engine_with_forms(forms: &[(&str, &[&str])]) -> DependencyEngine<SqliteStore> {
        let store = SqliteStore::open_in_memory().unwrap();
        for (form_id, fields) in forms {
            let mut form = FormDefinition::new(*form_id);
            form.id = (*form_id).to_owned();
            form.sections = vec![FormSection {
                id: "main".into(),
                title: "Main".into(),
                description: String::new(),
                order: 0,
                is_collapsible: false,
                fields: fields
                    .iter()
                    .map(|id| FormField {
                        id: (*id).to_owned(),
                        label: (*id).to_owned(),
                        field_type: FieldType::Text,
                        placeholder: String::new(),
                        help_text: String::new(),
                        is_required: false,
                        is_read_only: false,
                        is_hidden: false,
                        default_value: String::new(),
                        order: 0,
                        options: vec![],
                    })
                    .collect(),
            }];
            store.create_form(&form).unwrap();
        }
        DependencyEngine::new(Arc::new(store))
    }

    fn value_dep(src: &str, dst: &str) -> FormDependency {
        FormDependency::new(DependencyKind::Value, src, "f", dst, "f")
    }

    #[test]
    fn create_checks_form_and_field_existence() {
        let engine = engine_with_forms(&[("a", &["f"]), ("b", &["f"])]);

        engine.create_dependency(&value_dep("a", "b")).unwrap();

        let err = engine.create_dependency(&value_dep("a", "ghost")).unwrap_err();
        assert!(matches!(err, EngineError::UnknownForm { .. }));

        let bad_field = FormDependency::new(DependencyKind::Value, "a", "missing", "b", "f");
        let err = engine.create_dependency(&bad_field).unwrap_err();
        assert!(matches!(err, EngineError::UnknownField { .. }));
    }

    #[test]
    fn create_rejects_malformed_records() {
        let engine = engine_with_forms(&[("a", &["f"]), ("b", &["f"])]);

        let no_expr = FormDependency::new(DependencyKind::Calculation, "a", "f", "b", "f");
        let err = engine.create_dependency(&no_expr).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDependency(_)));
    }

    #[test]
    fn create_rejects_cycles_before_touching_storage() {
        let engine = engine_with_forms(&[("a", &["f"]), ("b", &["f"]), ("c", &["f"])]);

        engine.create_dependency(&value_dep("a", "b")).unwrap();
        engine.create_dependency(&value_dep("b", "c")).unwrap();

        let err = engine.create_dependency(&value_dep("c", "a")).unwrap_err();
        assert!(matches!(err, EngineError::CycleDetected));
        assert!(engine.would_create_cycle(&value_dep("c", "a")).unwrap());
        assert!(!engine.would_create_cycle(&value_dep("a", "c")).unwrap());
    }

    #[test]
    fn self_referential_validation_rule_is_accepted() {
        let engine = engine_with_forms(&[("a", &["f"])]);

        let rule = FormDependency::new(DependencyKind::Validation, "a", "f", "a", "f")
            .with_expression("value > 0");
        engine.create_dependency(&rule).unwrap();

        // The same edge as a writing kind is still a self-loop.
        let copy = FormDependency::new(DependencyKind::Value, "a", "f", "a", "f");
        let err = engine.create_dependency(&copy).unwrap_err();
        assert!(matches!(err, EngineError::CycleDetected));
    }

    #[test]
    fn update_and_delete_round_trip() {
        let engine = engine_with_forms(&[("a", &["f"]), ("b", &["f"])]);

        let mut dep = value_dep("a", "b");
        engine.create_dependency(&dep).unwrap();

        dep.execution_order = 7;
        engine.update_dependency(&dep).unwrap();
        let stored = engine.dependencies_for_form("a").unwrap();
        assert_eq!(stored[0].execution_order, 7);

        engine.delete_dependency(&dep.id).unwrap();
        assert!(engine.dependencies_for_form("a").unwrap().is_empty());
    }
}
