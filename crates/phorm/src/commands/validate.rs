//! `phorm validate` -- run validation rules against a document.

use anyhow::Result;

use crate::cli::ValidateArgs;
use crate::commands::process::load_input;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `phorm validate` command.
///
/// Exits non-zero when any validation rule fails, so the command can gate
/// scripted workflows.
pub fn run(ctx: &RuntimeContext, args: &ValidateArgs) -> Result<()> {
    let engine = ctx.open_engine()?;

    let document = load_input(&engine, &args.form_id, args.file.as_deref())?;
    let outcome = engine.validate(&args.form_id, document)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "form_id": args.form_id,
            "valid": outcome.is_valid(),
            "errors": outcome.errors,
        }));
    } else if outcome.is_valid() {
        if !ctx.quiet {
            println!("Form {} is valid.", args.form_id);
        }
    } else {
        println!("Form {} has {} validation error(s):", args.form_id, outcome.errors.len());
        for error in &outcome.errors {
            println!("  - {error}");
        }
    }

    if !outcome.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}
