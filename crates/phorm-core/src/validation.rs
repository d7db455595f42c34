//! Record-level validation of dependency records.
//!
//! These are the point checks that need nothing but the record itself:
//! endpoints present, kind known, expression/lookup key present where the
//! kind requires them. Referential checks (forms and fields exist) and the
//! acyclicity gate live with the engine and the store, which can see the
//! rest of the world.

use crate::dependency::FormDependency;
use crate::enums::DependencyKind;

/// Error type for dependency record validation failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("source form id is required")]
    SourceFormRequired,

    #[error("source field id is required")]
    SourceFieldRequired,

    #[error("target form id is required")]
    TargetFormRequired,

    #[error("target field id is required")]
    TargetFieldRequired,

    #[error("invalid dependency kind: {0} (must be one of: value, lookup, visibility, validation, calculation)")]
    InvalidKind(String),

    #[error("expression is required for {0} dependencies")]
    ExpressionRequired(String),

    #[error("lookup key is required for lookup dependencies")]
    LookupKeyRequired,
}

/// Validates a dependency record before it may be persisted.
pub fn validate_dependency(dep: &FormDependency) -> Result<(), ValidationError> {
    if dep.source_form_id.is_empty() {
        return Err(ValidationError::SourceFormRequired);
    }
    if dep.source_field_id.is_empty() {
        return Err(ValidationError::SourceFieldRequired);
    }
    if dep.target_form_id.is_empty() {
        return Err(ValidationError::TargetFormRequired);
    }
    if dep.target_field_id.is_empty() {
        return Err(ValidationError::TargetFieldRequired);
    }
    if !dep.kind.is_known() {
        return Err(ValidationError::InvalidKind(dep.kind.as_str().to_owned()));
    }
    if dep.kind.requires_expression() && dep.expression.is_empty() {
        return Err(ValidationError::ExpressionRequired(
            dep.kind.as_str().to_owned(),
        ));
    }
    if dep.kind.requires_lookup_key() && dep.lookup_key.is_empty() {
        return Err(ValidationError::LookupKeyRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_dep() -> FormDependency {
        FormDependency::new(DependencyKind::Value, "a", "f1", "b", "f2")
    }

    #[test]
    fn value_dependency_needs_no_expression() {
        assert!(validate_dependency(&value_dep()).is_ok());
    }

    #[test]
    fn empty_endpoints_rejected() {
        let mut dep = value_dep();
        dep.source_form_id.clear();
        assert_eq!(
            validate_dependency(&dep),
            Err(ValidationError::SourceFormRequired)
        );

        let mut dep = value_dep();
        dep.target_field_id.clear();
        assert_eq!(
            validate_dependency(&dep),
            Err(ValidationError::TargetFieldRequired)
        );
    }

    #[test]
    fn unknown_kind_rejected() {
        let mut dep = value_dep();
        dep.kind = DependencyKind::Other("mystery".into());
        assert_eq!(
            validate_dependency(&dep),
            Err(ValidationError::InvalidKind("mystery".into()))
        );
    }

    #[test]
    fn expression_kinds_require_expression() {
        for kind in [
            DependencyKind::Calculation,
            DependencyKind::Visibility,
            DependencyKind::Validation,
        ] {
            let mut dep = value_dep();
            dep.kind = kind.clone();
            assert_eq!(
                validate_dependency(&dep),
                Err(ValidationError::ExpressionRequired(
                    kind.as_str().to_owned()
                ))
            );
            dep.expression = "a.f1 > 0".into();
            assert!(validate_dependency(&dep).is_ok());
        }
    }

    #[test]
    fn lookup_requires_lookup_key() {
        let mut dep = value_dep();
        dep.kind = DependencyKind::Lookup;
        assert_eq!(
            validate_dependency(&dep),
            Err(ValidationError::LookupKeyRequired)
        );
        dep.lookup_key = "country_codes".into();
        assert!(validate_dependency(&dep).is_ok());
    }
}
