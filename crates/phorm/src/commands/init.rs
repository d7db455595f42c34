//! `phorm init` -- initialize a phorm database in the current directory.

use std::env;
use std::fs;

use anyhow::{Context, Result, bail};

use phorm_config::{PhormConfig, ensure_phorm_dir, save_config};
use phorm_storage::SqliteStore;

use crate::cli::InitArgs;
use crate::context::{DB_FILE_NAME, RuntimeContext};

/// Default gitignore content for the `.phorm` directory.
const GITIGNORE_CONTENT: &str = r#"# Phorm database files
*.db
*.db-journal
*.db-wal
*.db-shm
"#;

/// Execute the `phorm init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;

    let phorm_dir = cwd.join(".phorm");
    let db_path = phorm_dir.join(DB_FILE_NAME);

    // Safety guard: check for existing data unless --force
    if !args.force && db_path.exists() {
        bail!(
            "Found existing database at {}\n\n\
            This workspace is already initialized.\n\
            Use --force to re-initialize.",
            db_path.display()
        );
    }

    let phorm_dir = ensure_phorm_dir(&phorm_dir).context("failed to create .phorm directory")?;

    // Create .gitignore
    let gitignore_path = phorm_dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(&gitignore_path, GITIGNORE_CONTENT)
            .with_context(|| format!("failed to create .gitignore: {}", gitignore_path.display()))?;
    }

    // Create config.yaml with defaults when absent
    if !phorm_dir.join("config.yaml").exists() {
        save_config(&phorm_dir, &PhormConfig::default())
            .context("failed to write default config.yaml")?;
    }

    // Create the SQLite database and its schema
    SqliteStore::open(&db_path)
        .with_context(|| format!("failed to create database at {}", db_path.display()))?;

    if !ctx.quiet {
        println!();
        println!("phorm initialized successfully!");
        println!();
        println!("  Database: {}", db_path.display());
        println!();
        println!("Run `phorm form create <file.json>` to define your first form.");
        println!();
    }

    Ok(())
}
