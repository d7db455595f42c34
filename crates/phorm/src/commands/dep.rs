//! `phorm dep` -- manage dependencies between form fields.

use anyhow::{Result, bail};
use chrono::Utc;

use phorm_core::dependency::FormDependency;
use phorm_core::enums::DependencyKind;
use phorm_storage::FormStore;

use crate::cli::{DepAddArgs, DepArgs, DepCheckArgs, DepCommands, DepListArgs, DepRmArgs, DepUpdateArgs};
use crate::commands::parse_endpoint;
use crate::context::RuntimeContext;
use crate::output::{format_dep_row, output_json, output_table};

/// Execute the `phorm dep` command.
pub fn run(ctx: &RuntimeContext, args: &DepArgs) -> Result<()> {
    match &args.command {
        DepCommands::Add(args) => run_add(ctx, args),
        DepCommands::Update(args) => run_update(ctx, args),
        DepCommands::Rm(args) => run_rm(ctx, args),
        DepCommands::List(args) => run_list(ctx, args),
        DepCommands::Check(args) => run_check(ctx, args),
    }
}

fn run_add(ctx: &RuntimeContext, args: &DepAddArgs) -> Result<()> {
    let kind = DependencyKind::from(args.kind.as_str());
    if !kind.is_known() {
        bail!(
            "unknown dependency kind '{}' (expected one of: {})",
            args.kind,
            DependencyKind::known_values().join(", ")
        );
    }

    let (source_form, source_field) = parse_endpoint(&args.source)?;
    let (target_form, target_field) = parse_endpoint(&args.target)?;

    let mut dep = FormDependency::new(kind, source_form, source_field, target_form, target_field)
        .with_order(args.order);
    if let Some(ref expression) = args.expression {
        dep = dep.with_expression(expression.clone());
    }
    if let Some(ref key) = args.lookup_key {
        dep = dep.with_lookup_key(key.clone());
    }
    if let Some(ref description) = args.description {
        dep = dep.with_description(description.clone());
    }
    dep.created_by = ctx.actor.clone();

    let engine = ctx.open_engine()?;
    engine.create_dependency(&dep)?;

    if ctx.json {
        output_json(&dep);
    } else if !ctx.quiet {
        println!(
            "Added {} dependency {} ({} -> {})",
            dep.kind,
            dep.id,
            dep.source_key(),
            dep.target_key()
        );
    }
    Ok(())
}

fn run_update(ctx: &RuntimeContext, args: &DepUpdateArgs) -> Result<()> {
    let engine = ctx.open_engine()?;
    let mut dep = engine.store().get_dependency(&args.id)?;

    if let Some(ref expression) = args.expression {
        dep.expression = expression.clone();
    }
    if let Some(ref description) = args.description {
        dep.description = description.clone();
    }
    if let Some(order) = args.order {
        dep.execution_order = order;
    }
    if let Some(active) = args.active {
        dep.is_active = active;
    }
    dep.updated_at = Some(Utc::now());
    dep.updated_by = ctx.actor.clone();

    engine.update_dependency(&dep)?;

    if ctx.json {
        output_json(&dep);
    } else if !ctx.quiet {
        println!("Updated dependency {}", dep.id);
    }
    Ok(())
}

fn run_rm(ctx: &RuntimeContext, args: &DepRmArgs) -> Result<()> {
    let engine = ctx.open_engine()?;
    engine.delete_dependency(&args.id)?;

    if ctx.json {
        output_json(&serde_json::json!({ "deleted": args.id }));
    } else if !ctx.quiet {
        println!("Removed dependency {}", args.id);
    }
    Ok(())
}

fn run_list(ctx: &RuntimeContext, args: &DepListArgs) -> Result<()> {
    let store = ctx.open_store()?;

    let (items, total) = match &args.form {
        Some(form_id) => {
            let deps = store.dependencies_for_form(form_id)?;
            let total = deps.len() as i64;
            (deps, total)
        }
        None => {
            let page_size = args.page.page_size.unwrap_or(ctx.config.list.page_size);
            let page = store.list_dependencies(args.page.page, page_size)?;
            (page.items, page.total)
        }
    };

    if ctx.json {
        output_json(&items);
    } else if items.is_empty() {
        if !ctx.quiet {
            println!("No dependencies found.");
        }
    } else {
        let rows: Vec<Vec<String>> = items.iter().map(format_dep_row).collect();
        output_table(&["ID", "KIND", "SOURCE", "TARGET", "ORDER", "STATE"], &rows);
        if !ctx.quiet {
            println!("\n{} of {} dependency(ies)", rows.len(), total);
        }
    }
    Ok(())
}

fn run_check(ctx: &RuntimeContext, args: &DepCheckArgs) -> Result<()> {
    let (source_form, source_field) = parse_endpoint(&args.source)?;
    let (target_form, target_field) = parse_endpoint(&args.target)?;

    // A throwaway value dependency carries the candidate edge.
    let candidate = FormDependency::new(
        DependencyKind::Value,
        source_form,
        source_field,
        target_form,
        target_field,
    );

    let engine = ctx.open_engine()?;
    let cycle = engine.would_create_cycle(&candidate)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "source": args.source,
            "target": args.target,
            "would_create_cycle": cycle,
        }));
    } else if cycle {
        println!(
            "{} -> {} would create a CYCLE and will be rejected",
            args.source, args.target
        );
    } else {
        println!("{} -> {} is safe to add", args.source, args.target);
    }
    Ok(())
}
