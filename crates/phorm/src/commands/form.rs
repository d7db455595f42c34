//! `phorm form` -- manage form definitions.

use std::io::Read;

use anyhow::{Context, Result, bail};
use chrono::Utc;

use phorm_core::form::FormDefinition;
use phorm_storage::FormStore;

use crate::cli::{FormArgs, FormCommands, FormCreateArgs, FormSearchArgs, FormShowArgs, PageArgs};
use crate::context::RuntimeContext;
use crate::output::{format_form_detail, format_form_row, output_json, output_table};

/// Execute the `phorm form` command.
pub fn run(ctx: &RuntimeContext, args: &FormArgs) -> Result<()> {
    match &args.command {
        FormCommands::Create(args) => run_create(ctx, args),
        FormCommands::Show(args) => run_show(ctx, args),
        FormCommands::List(args) => run_list(ctx, args),
        FormCommands::Search(args) => run_search(ctx, args),
        FormCommands::Publish(args) => run_publish(ctx, args),
        FormCommands::Delete(args) => run_delete(ctx, args),
    }
}

fn run_create(ctx: &RuntimeContext, args: &FormCreateArgs) -> Result<()> {
    let raw = if args.file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read form definition from stdin")?;
        buf
    } else {
        std::fs::read_to_string(&args.file)
            .with_context(|| format!("failed to read form definition: {}", args.file))?
    };

    let mut form: FormDefinition =
        serde_json::from_str(&raw).with_context(|| format!("invalid form JSON: {}", args.file))?;

    if form.id.is_empty() {
        form.id = uuid_like_id(&form.name);
    }
    if form.all_fields().next().is_none() {
        bail!("form '{}' defines no fields", form.id);
    }
    form.created_at = Utc::now();
    form.created_by = ctx.actor.clone();

    let store = ctx.open_store()?;
    store.create_form(&form)?;

    if ctx.json {
        output_json(&form);
    } else if !ctx.quiet {
        println!("Created form {} ({})", form.id, form.name);
    }
    Ok(())
}

fn run_show(ctx: &RuntimeContext, args: &FormShowArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let form = store.get_form(&args.id)?;

    if ctx.json {
        output_json(&form);
    } else {
        println!("{}", format_form_detail(&form));
    }
    Ok(())
}

fn run_list(ctx: &RuntimeContext, args: &PageArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let page_size = args.page_size.unwrap_or(ctx.config.list.page_size);
    let page = store.list_forms(args.page, page_size)?;

    if ctx.json {
        output_json(&page.items);
    } else if page.items.is_empty() {
        if !ctx.quiet {
            println!("No forms found.");
        }
    } else {
        let rows: Vec<Vec<String>> = page.items.iter().map(format_form_row).collect();
        output_table(&["ID", "NAME", "VERSION", "STATUS", "FIELDS"], &rows);
        if !ctx.quiet {
            println!("\n{} of {} form(s)", page.items.len(), page.total);
        }
    }
    Ok(())
}

fn run_search(ctx: &RuntimeContext, args: &FormSearchArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let page_size = args.page.page_size.unwrap_or(ctx.config.list.page_size);
    let page = store.search_forms(&args.term, args.page.page, page_size)?;

    if ctx.json {
        output_json(&page.items);
    } else if page.items.is_empty() {
        if !ctx.quiet {
            println!("No forms match '{}'.", args.term);
        }
    } else {
        let rows: Vec<Vec<String>> = page.items.iter().map(format_form_row).collect();
        output_table(&["ID", "NAME", "VERSION", "STATUS", "FIELDS"], &rows);
    }
    Ok(())
}

fn run_publish(ctx: &RuntimeContext, args: &FormShowArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let mut form = store.get_form(&args.id)?;

    form.is_published = true;
    form.updated_at = Some(Utc::now());
    form.updated_by = ctx.actor.clone();
    store.update_form(&form)?;

    if ctx.json {
        output_json(&form);
    } else if !ctx.quiet {
        println!("Published form {}", form.id);
    }
    Ok(())
}

fn run_delete(ctx: &RuntimeContext, args: &FormShowArgs) -> Result<()> {
    let store = ctx.open_store()?;
    store.delete_form(&args.id)?;

    if ctx.json {
        output_json(&serde_json::json!({ "deleted": args.id }));
    } else if !ctx.quiet {
        println!("Deleted form {} (and its submissions)", args.id);
    }
    Ok(())
}

/// Derives a stable-looking id from the form name: lowercase, spaces to
/// dashes, other punctuation dropped.
fn uuid_like_id(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        uuid_fallback()
    } else {
        slug
    }
}

fn uuid_fallback() -> String {
    FormDefinition::new("").id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_slug_from_name() {
        assert_eq!(uuid_like_id("Batch Record"), "batch-record");
        assert_eq!(uuid_like_id("QA / Review!"), "qa--review");
        assert!(!uuid_like_id("!!!").is_empty());
    }
}
