//! Output formatting helpers for the `phorm` CLI.

use std::io::{self, Write};

use serde::Serialize;

use phorm_core::dependency::FormDependency;
use phorm_core::form::FormDefinition;
use phorm_core::submission::FormSubmission;

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple table with headers and rows.
///
/// Column widths are computed from the data for alignment.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{:<width$}", header, width = widths[i]);
    }
    let _ = writeln!(handle);

    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{}", "-".repeat(*width));
    }
    let _ = writeln!(handle);

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                let _ = write!(handle, "  ");
            }
            if i < widths.len() {
                let _ = write!(handle, "{:<width$}", cell, width = widths[i]);
            } else {
                let _ = write!(handle, "{}", cell);
            }
        }
        let _ = writeln!(handle);
    }
}

/// Format a form definition as a compact row for list output.
pub fn format_form_row(form: &FormDefinition) -> Vec<String> {
    vec![
        form.id.clone(),
        form.name.clone(),
        form.version.clone(),
        if form.is_published {
            "published".to_string()
        } else {
            "draft".to_string()
        },
        form.all_fields().count().to_string(),
    ]
}

/// Format a form definition in detailed multi-line view.
pub fn format_form_detail(form: &FormDefinition) -> String {
    let mut lines = Vec::new();

    lines.push(format!("{} [v{}] {}", form.id, form.version, form.name));
    lines.push(format!(
        "Status: {}",
        if form.is_published {
            "published"
        } else {
            "draft"
        }
    ));
    if !form.description.is_empty() {
        lines.push(format!("Description: {}", form.description));
    }
    lines.push(format!(
        "Created: {} by {}",
        form.created_at.format("%Y-%m-%d %H:%M"),
        if form.created_by.is_empty() {
            "unknown"
        } else {
            &form.created_by
        }
    ));

    for section in &form.sections {
        lines.push(String::new());
        lines.push(format!("SECTION {}", section.title));
        for field in &section.fields {
            let mut flags = Vec::new();
            if field.is_required {
                flags.push("required");
            }
            if field.is_read_only {
                flags.push("read-only");
            }
            if field.is_hidden {
                flags.push("hidden");
            }
            let suffix = if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            };
            lines.push(format!(
                "  {} [{}] {}{}",
                field.id, field.field_type, field.label, suffix
            ));
        }
    }

    lines.join("\n")
}

/// Format a dependency as a compact row for list output.
pub fn format_dep_row(dep: &FormDependency) -> Vec<String> {
    vec![
        dep.id.clone(),
        dep.kind.to_string(),
        dep.source_key(),
        dep.target_key(),
        dep.execution_order.to_string(),
        if dep.is_active {
            "active".to_string()
        } else {
            "inactive".to_string()
        },
    ]
}

/// Format a submission as a compact row for list output.
pub fn format_submission_row(sub: &FormSubmission) -> Vec<String> {
    vec![
        sub.id.clone(),
        sub.status.to_string(),
        sub.created_at.format("%Y-%m-%d %H:%M").to_string(),
        sub.created_by.clone(),
        sub.data.len().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use phorm_core::enums::DependencyKind;

    #[test]
    fn form_row_columns() {
        let mut form = FormDefinition::new("Batch Record");
        form.id = "batch".into();
        form.is_published = true;
        let row = format_form_row(&form);
        assert_eq!(row[0], "batch");
        assert_eq!(row[3], "published");
    }

    #[test]
    fn dep_row_columns() {
        let dep = FormDependency::new(DependencyKind::Calculation, "a", "qty", "b", "total")
            .with_expression("a.qty * 2")
            .with_order(3);
        let row = format_dep_row(&dep);
        assert_eq!(row[1], "calculation");
        assert_eq!(row[2], "a.qty");
        assert_eq!(row[3], "b.total");
        assert_eq!(row[4], "3");
        assert_eq!(row[5], "active");
    }

    #[test]
    fn table_output_smoke() {
        // Just ensure it doesn't panic
        let headers = &["ID", "Kind"];
        let rows = vec![vec!["d1".into(), "value".into()]];
        output_table(headers, &rows);
    }
}
