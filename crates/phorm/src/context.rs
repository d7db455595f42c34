//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds the state every command handler needs:
//! resolved database path, actor name, global flags, and loaded config.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use phorm_config::{PhormConfig, find_phorm_dir, load_config};
use phorm_engine::DependencyEngine;
use phorm_storage::SqliteStore;

use crate::cli::GlobalArgs;

/// Default database file name inside `.phorm/`.
pub const DB_FILE_NAME: &str = "phorm.db";

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Explicit database path from `--db`, if any.
    pub db_path: Option<PathBuf>,

    /// Actor name for audit stamps.
    pub actor: String,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,

    /// Loaded configuration (defaults when no `.phorm/` exists yet).
    pub config: PhormConfig,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    ///
    /// Resolves the actor name using the priority chain:
    /// `--actor` flag > `PHORM_ACTOR` env > config > `$USER` > `"unknown"`.
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        let config = Self::discover_phorm_dir()
            .and_then(|dir| load_config(&dir).ok())
            .unwrap_or_default();

        let actor = resolve_actor(global.actor.as_deref(), config.actor.as_deref());
        let db_path = global.db.as_ref().map(PathBuf::from);
        let json = global.json || config.json;

        Self {
            db_path,
            actor,
            json,
            verbose: global.verbose,
            quiet: global.quiet,
            config,
        }
    }

    /// Discover the `.phorm` directory by walking up from the current
    /// directory.
    pub fn discover_phorm_dir() -> Option<PathBuf> {
        let cwd = env::current_dir().ok()?;
        find_phorm_dir(&cwd)
    }

    /// Returns the resolved database file path: `--db` flag, then config,
    /// then the default file inside the discovered `.phorm/` directory.
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        if let Some(ref p) = self.db_path {
            return Ok(p.clone());
        }
        if let Some(ref p) = self.config.db {
            return Ok(PathBuf::from(p));
        }
        let dir = Self::discover_phorm_dir()
            .context("no .phorm directory found (run 'phorm init' first)")?;
        Ok(dir.join(DB_FILE_NAME))
    }

    /// Opens the store at the resolved path.
    pub fn open_store(&self) -> Result<SqliteStore> {
        let path = self.resolve_db_path()?;
        SqliteStore::open(&path)
            .with_context(|| format!("failed to open database at {}", path.display()))
    }

    /// Opens the store and wraps it in a dependency engine, wired to the
    /// lookup tables from config.
    pub fn open_engine(&self) -> Result<DependencyEngine<SqliteStore>> {
        let store = Arc::new(self.open_store()?);
        Ok(DependencyEngine::new(store).with_lookup(Arc::new(self.config.lookup_tables())))
    }
}

/// Resolves the actor name using the priority chain.
///
/// Priority: explicit flag > PHORM_ACTOR env > config > USER env > "unknown".
fn resolve_actor(flag_value: Option<&str>, config_value: Option<&str>) -> String {
    // 1. Explicit flag value (clap also maps PHORM_ACTOR here).
    if let Some(actor) = flag_value {
        if !actor.is_empty() {
            return actor.to_string();
        }
    }

    // 2. PHORM_ACTOR env (when clap did not capture it).
    if let Ok(actor) = env::var("PHORM_ACTOR") {
        if !actor.is_empty() {
            return actor;
        }
    }

    // 3. Config file.
    if let Some(actor) = config_value {
        if !actor.is_empty() {
            return actor.to_string();
        }
    }

    // 4. USER env (Unix) or USERNAME env (Windows).
    if let Ok(user) = env::var("USER").or_else(|_| env::var("USERNAME")) {
        if !user.is_empty() {
            return user;
        }
    }

    // 5. Fallback.
    "unknown".to_string()
}
