//! Persistence layer for pharmaceutical form definitions, submissions, and
//! cross-form dependencies.
//!
//! The public API is the [`FormStore`] trait; [`SqliteStore`] is the
//! SQLite-backed implementation. Dependency writes run a cycle guard under
//! the connection lock, so the stored dependency graph is acyclic by
//! construction.

pub mod error;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StorageError};
pub use sqlite::SqliteStore;
pub use traits::{FormStore, Page};

use phorm_core::dependency::FormDependency;
use phorm_core::form::FormDefinition;
use phorm_core::submission::FormSubmission;

impl FormStore for SqliteStore {
    fn create_form(&self, form: &FormDefinition) -> Result<()> {
        self.create_form_impl(form)
    }

    fn get_form(&self, id: &str) -> Result<FormDefinition> {
        self.get_form_impl(id)
    }

    fn update_form(&self, form: &FormDefinition) -> Result<()> {
        self.update_form_impl(form)
    }

    fn delete_form(&self, id: &str) -> Result<()> {
        self.delete_form_impl(id)
    }

    fn list_forms(&self, page: u32, page_size: u32) -> Result<Page<FormDefinition>> {
        self.list_forms_impl(page, page_size)
    }

    fn search_forms(&self, term: &str, page: u32, page_size: u32) -> Result<Page<FormDefinition>> {
        self.search_forms_impl(term, page, page_size)
    }

    fn create_submission(&self, submission: &FormSubmission) -> Result<()> {
        self.create_submission_impl(submission)
    }

    fn get_submission(&self, id: &str) -> Result<FormSubmission> {
        self.get_submission_impl(id)
    }

    fn update_submission(&self, submission: &FormSubmission) -> Result<()> {
        self.update_submission_impl(submission)
    }

    fn delete_submission(&self, id: &str) -> Result<()> {
        self.delete_submission_impl(id)
    }

    fn list_submissions(
        &self,
        form_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<FormSubmission>> {
        self.list_submissions_impl(form_id, page, page_size)
    }

    fn latest_submission(&self, form_id: &str) -> Result<Option<FormSubmission>> {
        self.latest_submission_impl(form_id)
    }

    fn create_dependency(&self, dependency: &FormDependency) -> Result<()> {
        self.create_dependency_impl(dependency)
    }

    fn get_dependency(&self, id: &str) -> Result<FormDependency> {
        self.get_dependency_impl(id)
    }

    fn update_dependency(&self, dependency: &FormDependency) -> Result<()> {
        self.update_dependency_impl(dependency)
    }

    fn delete_dependency(&self, id: &str) -> Result<()> {
        self.delete_dependency_impl(id)
    }

    fn list_dependencies(&self, page: u32, page_size: u32) -> Result<Page<FormDependency>> {
        self.list_dependencies_impl(page, page_size)
    }

    fn dependencies_for_form(&self, form_id: &str) -> Result<Vec<FormDependency>> {
        self.dependencies_for_form_impl(form_id)
    }

    fn active_dependencies(&self) -> Result<Vec<FormDependency>> {
        self.active_dependencies_impl()
    }
}
