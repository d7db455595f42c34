//! Server-side dependency engine.
//!
//! [`DependencyEngine`] runs a form's cross-form dependencies against a
//! working document ([`DependencyEngine::process`]), evaluates validation
//! rules ([`DependencyEngine::validate`]), and gates dependency
//! administration behind record, referential, and acyclicity checks.

pub mod admin;
pub mod cache;
pub mod error;
pub mod processor;

pub use error::{EngineError, Result};
pub use processor::{DependencyEngine, ValidationOutcome};
