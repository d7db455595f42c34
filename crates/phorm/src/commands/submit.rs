//! `phorm submit` -- create a submission for a form.
//!
//! The default path runs the full server-side pipeline: process
//! dependencies against the document, evaluate validation rules, and only
//! then persist. `--no-process` stores the raw document; `--force` stores
//! despite validation failures.

use anyhow::{Result, bail};

use phorm_core::submission::FormSubmission;
use phorm_storage::FormStore;

use crate::cli::SubmitArgs;
use crate::commands::read_document;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `phorm submit` command.
pub fn run(ctx: &RuntimeContext, args: &SubmitArgs) -> Result<()> {
    let engine = ctx.open_engine()?;

    // Fail early on an unknown form id.
    let form = engine.store().get_form(&args.form_id)?;

    let raw = read_document(&args.file)?;

    // `validate` derives the document before evaluating rules, so one
    // call yields both the processed document and the failure list.
    let outcome = engine.validate(&args.form_id, raw.clone())?;
    if !outcome.is_valid() && !args.force {
        let mut message = format!("submission for form '{}' failed validation:", form.id);
        for error in &outcome.errors {
            message.push_str("\n  - ");
            message.push_str(error);
        }
        bail!(message);
    }
    for error in &outcome.errors {
        eprintln!("Warning: {error}");
    }

    let data = if args.no_process { raw } else { outcome.document };
    let mut submission = FormSubmission::new(&args.form_id, data);
    submission.created_by = ctx.actor.clone();
    engine.store().create_submission(&submission)?;

    if ctx.json {
        output_json(&submission);
    } else if !ctx.quiet {
        println!(
            "Created submission {} for form {}",
            submission.id, args.form_id
        );
    }
    Ok(())
}
