//! The form registry -- state and propagation for an interactive session.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use phorm_core::dependency::FormDependency;
use phorm_core::document::FormDocument;
use phorm_core::enums::DependencyKind;
use phorm_core::lookup::LookupProvider;
use phorm_core::value::FieldValue;
use phorm_expr::Evaluator;

/// Errors from registry operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LiveError {
    #[error("form not registered: {0}")]
    UnknownForm(String),
}

/// One field of a registered form: its current value and whether the
/// control is enabled. Visibility dependencies toggle `enabled`; the
/// value survives a disable so re-enabling restores it.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveField {
    pub value: FieldValue,
    pub enabled: bool,
}

impl LiveField {
    fn new(value: FieldValue) -> Self {
        Self {
            value,
            enabled: true,
        }
    }
}

/// A registered form: its fields in deterministic order.
#[derive(Debug, Clone, Default)]
pub struct LiveForm {
    fields: BTreeMap<String, LiveField>,
}

impl LiveForm {
    fn from_document(document: &FormDocument) -> Self {
        let fields = document
            .fields()
            .map(|(id, value)| (id.clone(), LiveField::new(value.clone())))
            .collect();
        Self { fields }
    }

    /// The form's current values as a document (enabled flags drop out).
    fn snapshot(&self) -> FormDocument {
        let mut doc = FormDocument::new();
        for (id, field) in &self.fields {
            doc = doc.set(id, field.value.clone());
        }
        doc
    }
}

/// The set of forms open in a session plus the dependencies between them.
#[derive(Default)]
pub struct FormRegistry {
    forms: HashMap<String, LiveForm>,
    dependencies: Vec<FormDependency>,
    lookup: Option<Box<dyn LookupProvider>>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a lookup backend for lookup dependencies.
    #[must_use]
    pub fn with_lookup(mut self, lookup: Box<dyn LookupProvider>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Registers a form with its current document. Re-registering replaces
    /// the previous state.
    pub fn register_form(&mut self, form_id: impl Into<String>, document: &FormDocument) {
        self.forms
            .insert(form_id.into(), LiveForm::from_document(document));
    }

    pub fn unregister_form(&mut self, form_id: &str) {
        self.forms.remove(form_id);
    }

    pub fn is_registered(&self, form_id: &str) -> bool {
        self.forms.contains_key(form_id)
    }

    /// Replaces the dependency set and re-applies everything once.
    pub fn set_dependencies(&mut self, mut dependencies: Vec<FormDependency>) {
        dependencies.sort_by_key(|d| d.execution_order);
        self.dependencies = dependencies;
        self.refresh();
    }

    /// Adds one dependency and applies it immediately.
    pub fn add_dependency(&mut self, dependency: FormDependency) {
        self.apply(&dependency);
        let at = self
            .dependencies
            .partition_point(|d| d.execution_order <= dependency.execution_order);
        self.dependencies.insert(at, dependency);
    }

    /// Sets a field value and propagates to dependencies sourced from that
    /// field. Propagation is single-hop: targets written here do not
    /// trigger their own dependencies.
    pub fn set_value(
        &mut self,
        form_id: &str,
        field_id: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), LiveError> {
        let form = self
            .forms
            .get_mut(form_id)
            .ok_or_else(|| LiveError::UnknownForm(form_id.to_owned()))?;
        let value = value.into();
        form.fields
            .entry(field_id.to_owned())
            .and_modify(|f| f.value = value.clone())
            .or_insert_with(|| LiveField::new(value));

        let triggered: Vec<FormDependency> = self
            .dependencies
            .iter()
            .filter(|d| {
                d.is_active && d.source_form_id == form_id && d.source_field_id == field_id
            })
            .cloned()
            .collect();
        for dep in &triggered {
            self.apply(dep);
        }
        Ok(())
    }

    /// Re-applies every active dependency once, in execution order.
    pub fn refresh(&mut self) {
        let deps = self.dependencies.clone();
        for dep in deps.iter().filter(|d| d.is_active) {
            self.apply(dep);
        }
    }

    pub fn value(&self, form_id: &str, field_id: &str) -> Option<&FieldValue> {
        self.forms
            .get(form_id)
            .and_then(|form| form.fields.get(field_id))
            .map(|field| &field.value)
    }

    /// Whether the control is enabled. Unknown fields default to enabled.
    pub fn is_enabled(&self, form_id: &str, field_id: &str) -> bool {
        self.forms
            .get(form_id)
            .and_then(|form| form.fields.get(field_id))
            .is_none_or(|field| field.enabled)
    }

    /// The current values of a registered form as a document.
    pub fn snapshot(&self, form_id: &str) -> Option<FormDocument> {
        self.forms.get(form_id).map(LiveForm::snapshot)
    }

    /// Applies one dependency against the registered forms. Dependencies
    /// touching unregistered forms are skipped.
    fn apply(&mut self, dep: &FormDependency) {
        if !self.forms.contains_key(&dep.source_form_id)
            || !self.forms.contains_key(&dep.target_form_id)
        {
            debug!(dependency = %dep.id, "skipping dependency: form not registered");
            return;
        }

        match dep.kind {
            DependencyKind::Value => {
                if let Some(value) = self.source_value(dep) {
                    self.write_target(dep, value);
                }
            }
            DependencyKind::Lookup => self.apply_lookup(dep),
            DependencyKind::Calculation => match self.evaluator(dep).evaluate(&dep.expression) {
                Ok(value) => self.write_target(dep, value),
                Err(e) => {
                    warn!(dependency = %dep.id, error = %e, "live calculation failed");
                }
            },
            DependencyKind::Visibility => self.apply_visibility(dep),
            // Validation feedback comes from the server on save.
            DependencyKind::Validation => {}
            DependencyKind::Other(ref kind) => {
                warn!(dependency = %dep.id, kind, "skipping dependency of unknown kind");
            }
        }
    }

    /// Unlike the server engine, an unresolved lookup writes nothing.
    fn apply_lookup(&mut self, dep: &FormDependency) {
        let Some(source) = self.source_value(dep) else {
            return;
        };
        let Some(provider) = &self.lookup else {
            return;
        };
        match provider.resolve(&dep.lookup_key, &source) {
            Ok(Some(value)) => self.write_target(dep, value),
            Ok(None) => {
                debug!(dependency = %dep.id, key = %dep.lookup_key, "live lookup did not resolve");
            }
            Err(e) => {
                warn!(dependency = %dep.id, error = %e, "live lookup backend failed");
            }
        }
    }

    /// Visibility enables or disables the target control in place.
    fn apply_visibility(&mut self, dep: &FormDependency) {
        let visible = match self.evaluator(dep).evaluate_bool(&dep.expression) {
            Ok(v) => v,
            Err(e) => {
                warn!(dependency = %dep.id, error = %e, "live visibility condition failed");
                return;
            }
        };
        if let Some(form) = self.forms.get_mut(&dep.target_form_id) {
            form.fields
                .entry(dep.target_field_id.clone())
                .and_modify(|f| f.enabled = visible)
                .or_insert_with(|| {
                    let mut field = LiveField::new(FieldValue::Null);
                    field.enabled = visible;
                    field
                });
        }
    }

    fn evaluator(&self, dep: &FormDependency) -> Evaluator {
        let mut eval = Evaluator::new();
        for (form_id, form) in &self.forms {
            eval.bind_document(form_id.clone(), form.snapshot());
        }
        eval.bind_value("value", self.source_value(dep).unwrap_or(FieldValue::Null));
        eval
    }

    fn source_value(&self, dep: &FormDependency) -> Option<FieldValue> {
        self.forms
            .get(&dep.source_form_id)
            .and_then(|form| form.fields.get(&dep.source_field_id))
            .map(|field| field.value.clone())
    }

    fn write_target(&mut self, dep: &FormDependency, value: FieldValue) {
        if let Some(form) = self.forms.get_mut(&dep.target_form_id) {
            form.fields
                .entry(dep.target_field_id.clone())
                .and_modify(|f| f.value = value.clone())
                .or_insert_with(|| LiveField::new(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use phorm_core::lookup::TableLookup;

    fn dep(kind: DependencyKind, src: (&str, &str), dst: (&str, &str)) -> FormDependency {
        FormDependency::new(kind, src.0, src.1, dst.0, dst.1)
    }

    fn registry_ab() -> FormRegistry {
        let mut registry = FormRegistry::new();
        registry.register_form("a", &FormDocument::new().with_field("qty", 3i64));
        registry.register_form("b", &FormDocument::new().with_field("price", 10i64));
        registry
    }

    #[test]
    fn set_value_propagates_value_dependency() {
        let mut registry = registry_ab();
        registry.set_dependencies(vec![dep(
            DependencyKind::Value,
            ("a", "qty"),
            ("b", "qty"),
        )]);

        registry.set_value("a", "qty", 7i64).unwrap();
        assert_eq!(registry.value("b", "qty"), Some(&FieldValue::Int(7)));
    }

    #[test]
    fn set_value_on_unregistered_form_is_an_error() {
        let mut registry = FormRegistry::new();
        assert_eq!(
            registry.set_value("ghost", "f", 1i64),
            Err(LiveError::UnknownForm("ghost".into()))
        );
    }

    #[test]
    fn calculation_updates_on_source_change() {
        let mut registry = registry_ab();
        registry.set_dependencies(vec![dep(
            DependencyKind::Calculation,
            ("a", "qty"),
            ("b", "total"),
        )
        .with_expression("a.qty * b.price")]);

        assert_eq!(registry.value("b", "total"), Some(&FieldValue::Int(30)));
        registry.set_value("a", "qty", 5i64).unwrap();
        assert_eq!(registry.value("b", "total"), Some(&FieldValue::Int(50)));
    }

    #[test]
    fn propagation_is_single_hop() {
        let mut registry = FormRegistry::new();
        registry.register_form("a", &FormDocument::new().with_field("x", 1i64));
        registry.register_form("b", &FormDocument::new());
        registry.register_form("c", &FormDocument::new());
        registry.set_dependencies(vec![
            dep(DependencyKind::Value, ("a", "x"), ("b", "x")),
            dep(DependencyKind::Value, ("b", "x"), ("c", "x")),
        ]);

        // set_dependencies ran one full refresh, so c.x saw the initial 1.
        assert_eq!(registry.value("c", "x"), Some(&FieldValue::Int(1)));

        // Changing a.x updates b.x but does not cascade into c.x.
        registry.set_value("a", "x", 2i64).unwrap();
        assert_eq!(registry.value("b", "x"), Some(&FieldValue::Int(2)));
        assert_eq!(registry.value("c", "x"), Some(&FieldValue::Int(1)));

        // A refresh reconciles the second hop.
        registry.refresh();
        assert_eq!(registry.value("c", "x"), Some(&FieldValue::Int(2)));
    }

    #[test]
    fn visibility_toggles_enabled_flag() {
        let mut registry = FormRegistry::new();
        registry.register_form(
            "a",
            &FormDocument::new()
                .with_field("kind", "standard")
                .with_field("details", ""),
        );
        registry.set_dependencies(vec![dep(
            DependencyKind::Visibility,
            ("a", "kind"),
            ("a", "details"),
        )
        .with_expression("value == 'other'")]);

        assert!(!registry.is_enabled("a", "details"));
        registry.set_value("a", "kind", "other").unwrap();
        assert!(registry.is_enabled("a", "details"));
    }

    #[test]
    fn disabling_a_field_keeps_its_value() {
        let mut registry = FormRegistry::new();
        registry.register_form(
            "a",
            &FormDocument::new()
                .with_field("kind", "other")
                .with_field("details", "precious"),
        );
        registry.set_dependencies(vec![dep(
            DependencyKind::Visibility,
            ("a", "kind"),
            ("a", "details"),
        )
        .with_expression("value == 'other'")]);

        registry.set_value("a", "kind", "standard").unwrap();
        assert!(!registry.is_enabled("a", "details"));
        assert_eq!(
            registry.value("a", "details"),
            Some(&FieldValue::Text("precious".into()))
        );
    }

    #[test]
    fn unresolved_lookup_writes_nothing() {
        let mut tables = TableLookup::new();
        tables.insert("atc_codes", "aspirin", "N02BA01");
        let mut registry = FormRegistry::new().with_lookup(Box::new(tables));
        registry.register_form("a", &FormDocument::new().with_field("drug", "ibuprofen"));
        registry.set_dependencies(vec![dep(
            DependencyKind::Lookup,
            ("a", "drug"),
            ("a", "atc"),
        )
        .with_lookup_key("atc_codes")]);

        assert_eq!(registry.value("a", "atc"), None);

        registry.set_value("a", "drug", "aspirin").unwrap();
        assert_eq!(
            registry.value("a", "atc"),
            Some(&FieldValue::Text("N02BA01".into()))
        );
    }

    #[test]
    fn dependencies_touching_unregistered_forms_are_skipped() {
        let mut registry = FormRegistry::new();
        registry.register_form("a", &FormDocument::new().with_field("x", 1i64));
        registry.set_dependencies(vec![dep(DependencyKind::Value, ("a", "x"), ("gone", "x"))]);

        registry.set_value("a", "x", 2i64).unwrap();
        assert!(registry.snapshot("gone").is_none());
    }

    #[test]
    fn add_dependency_applies_immediately_in_order() {
        let mut registry = registry_ab();
        registry.add_dependency(
            dep(DependencyKind::Calculation, ("a", "qty"), ("b", "total"))
                .with_expression("a.qty * b.price"),
        );
        assert_eq!(registry.value("b", "total"), Some(&FieldValue::Int(30)));
    }

    #[test]
    fn unregister_drops_state() {
        let mut registry = registry_ab();
        registry.unregister_form("b");
        assert!(!registry.is_registered("b"));
        assert!(registry.value("b", "price").is_none());
        assert!(registry.is_enabled("b", "price"));
    }

    #[test]
    fn snapshot_reflects_propagated_values() {
        let mut registry = registry_ab();
        registry.set_dependencies(vec![dep(
            DependencyKind::Value,
            ("a", "qty"),
            ("b", "qty"),
        )]);
        registry.set_value("a", "qty", 9i64).unwrap();

        let snap = registry.snapshot("b").unwrap();
        assert_eq!(snap.get("qty"), Some(&FieldValue::Int(9)));
        assert_eq!(snap.get("price"), Some(&FieldValue::Int(10)));
    }
}
