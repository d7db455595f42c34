//! Sandboxed expression evaluator for dependency rules.
//!
//! Dependency expressions are stored data, so they must never reach a
//! general-purpose scripting engine. This crate implements the narrow
//! language the dependency kinds need and nothing more: arithmetic,
//! comparison, boolean logic, string concatenation, literals, and
//! `form.field` member access into bound form documents. Evaluation is
//! synchronous, bounded, and has no access outside the supplied bindings.

pub mod engine;
pub mod lexer;
pub mod parser;
pub mod types;

pub use engine::Evaluator;
pub use types::ExprError;
