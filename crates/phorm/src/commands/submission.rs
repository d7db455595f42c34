//! `phorm submission` -- inspect stored submissions.

use anyhow::Result;

use phorm_storage::FormStore;

use crate::cli::{SubmissionArgs, SubmissionCommands, SubmissionListArgs, SubmissionShowArgs};
use crate::context::RuntimeContext;
use crate::output::{format_submission_row, output_json, output_table};

/// Execute the `phorm submission` command.
pub fn run(ctx: &RuntimeContext, args: &SubmissionArgs) -> Result<()> {
    match &args.command {
        SubmissionCommands::Show(args) => run_show(ctx, args),
        SubmissionCommands::List(args) => run_list(ctx, args),
    }
}

fn run_show(ctx: &RuntimeContext, args: &SubmissionShowArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let submission = store.get_submission(&args.id)?;

    if ctx.json {
        output_json(&submission);
    } else {
        println!(
            "{} for form {} ({})",
            submission.id, submission.form_id, submission.status
        );
        println!(
            "Created: {} by {}",
            submission.created_at.format("%Y-%m-%d %H:%M"),
            if submission.created_by.is_empty() {
                "unknown"
            } else {
                &submission.created_by
            }
        );
        if !submission.comments.is_empty() {
            println!("Comments: {}", submission.comments);
        }
        println!();
        for (field, value) in submission.data.fields() {
            println!("  {field} = {value}");
        }
    }
    Ok(())
}

fn run_list(ctx: &RuntimeContext, args: &SubmissionListArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let page_size = args.page.page_size.unwrap_or(ctx.config.list.page_size);
    let page = store.list_submissions(&args.form_id, args.page.page, page_size)?;

    if ctx.json {
        output_json(&page.items);
    } else if page.items.is_empty() {
        if !ctx.quiet {
            println!("No submissions for form {}.", args.form_id);
        }
    } else {
        let rows: Vec<Vec<String>> = page.items.iter().map(format_submission_row).collect();
        output_table(&["ID", "STATUS", "CREATED", "BY", "FIELDS"], &rows);
        if !ctx.quiet {
            println!("\n{} of {} submission(s)", page.items.len(), page.total);
        }
    }
    Ok(())
}
