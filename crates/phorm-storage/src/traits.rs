//! The [`FormStore`] trait -- the public API for form persistence.
//!
//! The dependency engine and the CLI depend on this trait rather than on a
//! concrete backend so alternative implementations can be substituted.

use phorm_core::dependency::FormDependency;
use phorm_core::form::FormDefinition;
use phorm_core::submission::FormSubmission;

use crate::error::Result;

/// A page of results with the total row count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// CRUD for form definitions, submissions, and dependency records.
///
/// Paginated listings take a 1-based `page` and a `page_size`.
pub trait FormStore: Send + Sync {
    // -- Form definitions ----------------------------------------------------

    fn create_form(&self, form: &FormDefinition) -> Result<()>;
    fn get_form(&self, id: &str) -> Result<FormDefinition>;
    fn update_form(&self, form: &FormDefinition) -> Result<()>;
    fn delete_form(&self, id: &str) -> Result<()>;
    fn list_forms(&self, page: u32, page_size: u32) -> Result<Page<FormDefinition>>;

    /// Case-insensitive search over form name and description.
    fn search_forms(&self, term: &str, page: u32, page_size: u32) -> Result<Page<FormDefinition>>;

    // -- Submissions ---------------------------------------------------------

    fn create_submission(&self, submission: &FormSubmission) -> Result<()>;
    fn get_submission(&self, id: &str) -> Result<FormSubmission>;
    fn update_submission(&self, submission: &FormSubmission) -> Result<()>;
    fn delete_submission(&self, id: &str) -> Result<()>;
    fn list_submissions(
        &self,
        form_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<FormSubmission>>;

    /// The most recently created submission for a form, if any. Absence is
    /// a legitimate state (forms are filled incrementally), so this returns
    /// an `Option` rather than a not-found error.
    fn latest_submission(&self, form_id: &str) -> Result<Option<FormSubmission>>;

    // -- Dependencies --------------------------------------------------------

    /// Persists a dependency. Fails with
    /// [`StorageError::CycleDetected`](crate::StorageError::CycleDetected)
    /// if the new edge would close a cycle in the active dependency graph.
    fn create_dependency(&self, dependency: &FormDependency) -> Result<()>;

    fn get_dependency(&self, id: &str) -> Result<FormDependency>;

    /// Updates a dependency, re-running the cycle guard against the active
    /// set minus the record's own previous edge.
    fn update_dependency(&self, dependency: &FormDependency) -> Result<()>;

    fn delete_dependency(&self, id: &str) -> Result<()>;
    fn list_dependencies(&self, page: u32, page_size: u32) -> Result<Page<FormDependency>>;

    /// All dependencies whose source or target form is `form_id`, ordered
    /// by execution order then insertion order.
    fn dependencies_for_form(&self, form_id: &str) -> Result<Vec<FormDependency>>;

    /// All active dependencies, for cycle checking. The full set, not a
    /// page: a cycle can close through forms unrelated to the candidate.
    fn active_dependencies(&self) -> Result<Vec<FormDependency>>;
}
