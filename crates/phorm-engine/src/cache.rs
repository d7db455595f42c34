//! Per-pass cache of form documents.
//!
//! One [`FormDataCache`] lives for the duration of a single processing
//! pass. It starts with the working document of the form being processed
//! and lazily pulls the latest submission of any other form a dependency
//! touches. Forms without a submission are memoized as missing so a pass
//! over many dependencies hits the store at most once per form.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use phorm_core::document::FormDocument;
use phorm_storage::FormStore;

use crate::error::Result;

pub struct FormDataCache {
    documents: HashMap<String, FormDocument>,
    missing: HashSet<String>,
}

impl FormDataCache {
    /// Seeds the cache with the working document of the form under
    /// processing.
    pub fn new(form_id: &str, data: FormDocument) -> Self {
        let mut documents = HashMap::new();
        documents.insert(form_id.to_owned(), data);
        Self {
            documents,
            missing: HashSet::new(),
        }
    }

    /// Makes sure `form_id` is resolved one way or the other: either its
    /// document is cached or the form is known to have no submission.
    /// Returns `true` if a document is available.
    pub fn ensure(&mut self, form_id: &str, store: &dyn FormStore) -> Result<bool> {
        if self.documents.contains_key(form_id) {
            return Ok(true);
        }
        if self.missing.contains(form_id) {
            return Ok(false);
        }

        match store.latest_submission(form_id)? {
            Some(submission) => {
                debug!(form_id, "loaded latest submission into cache");
                self.documents.insert(form_id.to_owned(), submission.data);
                Ok(true)
            }
            None => {
                self.missing.insert(form_id.to_owned());
                Ok(false)
            }
        }
    }

    pub fn get(&self, form_id: &str) -> Option<&FormDocument> {
        self.documents.get(form_id)
    }

    /// Replaces a cached document (after a dependency wrote to it).
    pub fn put(&mut self, form_id: &str, document: FormDocument) {
        self.missing.remove(form_id);
        self.documents.insert(form_id.to_owned(), document);
    }

    /// Consumes the cache, yielding the document cached for `form_id`.
    pub fn into_document(mut self, form_id: &str) -> FormDocument {
        self.documents.remove(form_id).unwrap_or_default()
    }

    /// All cached (form id, document) pairs, for expression binding.
    pub fn documents(&self) -> impl Iterator<Item = (&String, &FormDocument)> {
        self.documents.iter()
    }
}
