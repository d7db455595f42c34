//! Form submission -- one filled-in instance of a form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::FormDocument;
use crate::enums::SubmissionStatus;

/// A form submission with the data provided by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    #[serde(default)]
    pub id: String,

    pub form_id: String,

    #[serde(default)]
    pub data: FormDocument,

    #[serde(default)]
    pub status: SubmissionStatus,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub approved_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rejected_by: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comments: String,
}

impl FormSubmission {
    /// Creates a draft submission with a fresh id.
    pub fn new(form_id: impl Into<String>, data: FormDocument) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            form_id: form_id.into(),
            data,
            status: SubmissionStatus::Draft,
            created_at: Utc::now(),
            created_by: String::new(),
            updated_at: None,
            updated_by: String::new(),
            approved_at: None,
            approved_by: String::new(),
            rejected_at: None,
            rejected_by: String::new(),
            comments: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    #[test]
    fn new_submission_is_draft() {
        let sub = FormSubmission::new("form-a", FormDocument::new().with_field("qty", 3i64));
        assert_eq!(sub.status, SubmissionStatus::Draft);
        assert!(!sub.id.is_empty());
        assert_eq!(sub.data.get("qty"), Some(&FieldValue::Int(3)));
    }

    #[test]
    fn serde_round_trip() {
        let sub = FormSubmission::new("form-a", FormDocument::new().with_field("x", "y"));
        let json = serde_json::to_string(&sub).unwrap();
        assert!(json.contains(r#""status":"draft""#));
        let back: FormSubmission = serde_json::from_str(&json).unwrap();
        assert_eq!(back.form_id, "form-a");
        assert_eq!(back.data, sub.data);
    }
}
