//! Command handlers for the `phorm` CLI.

pub mod dep;
pub mod form;
pub mod init;
pub mod process;
pub mod submission;
pub mod submit;
pub mod validate;
pub mod version;

use std::io::Read;

use anyhow::{Context, Result};

use phorm_core::document::FormDocument;

/// Reads a JSON document from a file path, or from stdin when the path
/// is `-`.
pub fn read_document(path: &str) -> Result<FormDocument> {
    let raw = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read document from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read document file: {path}"))?
    };
    FormDocument::from_json_str(&raw).with_context(|| format!("invalid JSON document: {path}"))
}

/// Splits a `form.field` endpoint into its parts.
pub fn parse_endpoint(endpoint: &str) -> Result<(&str, &str)> {
    endpoint
        .split_once('.')
        .filter(|(form, field)| !form.is_empty() && !field.is_empty())
        .with_context(|| format!("invalid endpoint '{endpoint}' (expected form.field)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_endpoint_splits_on_first_dot() {
        assert_eq!(parse_endpoint("a.qty").unwrap(), ("a", "qty"));
        assert_eq!(parse_endpoint("a.b.c").unwrap(), ("a", "b.c"));
        assert!(parse_endpoint("nodot").is_err());
        assert!(parse_endpoint(".field").is_err());
        assert!(parse_endpoint("form.").is_err());
    }
}
