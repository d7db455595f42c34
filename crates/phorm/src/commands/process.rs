//! `phorm process` -- run dependencies against a document and print the
//! result without storing anything.

use anyhow::{Context, Result};

use phorm_core::document::FormDocument;
use phorm_storage::FormStore;

use crate::cli::ProcessArgs;
use crate::commands::read_document;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `phorm process` command.
pub fn run(ctx: &RuntimeContext, args: &ProcessArgs) -> Result<()> {
    let engine = ctx.open_engine()?;

    let document = load_input(&engine, &args.form_id, args.file.as_deref())?;
    let result = engine.process(&args.form_id, document)?;

    if ctx.json {
        output_json(&result);
    } else {
        for (field, value) in result.fields() {
            println!("{field} = {value}");
        }
    }
    Ok(())
}

/// Loads the working document: an explicit file, or the form's latest
/// submission when no file is given.
pub fn load_input(
    engine: &phorm_engine::DependencyEngine<phorm_storage::SqliteStore>,
    form_id: &str,
    file: Option<&str>,
) -> Result<FormDocument> {
    match file {
        Some(path) => read_document(path),
        None => {
            let submission = engine
                .store()
                .latest_submission(form_id)?
                .with_context(|| format!("form '{form_id}' has no submissions to process"))?;
            Ok(submission.data)
        }
    }
}
