//! Core types for the phorm system.
//!
//! This crate contains the domain model shared by the storage layer, the
//! dependency engine, and the live client mirror: field values, form
//! documents, form definitions, submissions, dependency records, and the
//! dependency graph with its cycle guard.

pub mod dependency;
pub mod document;
pub mod enums;
pub mod form;
pub mod graph;
pub mod lookup;
pub mod submission;
pub mod validation;
pub mod value;
