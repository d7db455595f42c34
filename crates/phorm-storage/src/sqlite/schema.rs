//! DDL statements for the SQLite schema.
//!
//! Timestamps are stored as TEXT in RFC 3339 form (SQLite has no native
//! datetime type). Booleans are INTEGER 0/1. Form sections, submission
//! data, and form metadata are JSON blobs stored as TEXT.

/// Current schema version. Bumped whenever DDL changes.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Core DDL statements executed during `init_schema`.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Config table --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS config (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    "#,
    // -- Form definitions ----------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS forms (
        id           TEXT PRIMARY KEY,
        name         TEXT NOT NULL,
        description  TEXT NOT NULL DEFAULT '',
        version      TEXT NOT NULL DEFAULT '1.0',
        is_published INTEGER NOT NULL DEFAULT 0,
        direction    TEXT NOT NULL DEFAULT 'rtl',
        sections     TEXT NOT NULL DEFAULT '[]',
        metadata     TEXT NOT NULL DEFAULT '{}',
        created_at   TEXT NOT NULL,
        created_by   TEXT NOT NULL DEFAULT '',
        updated_at   TEXT,
        updated_by   TEXT NOT NULL DEFAULT ''
    );
    "#,
    // -- Submissions ---------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS submissions (
        id          TEXT PRIMARY KEY,
        form_id     TEXT NOT NULL REFERENCES forms(id) ON DELETE CASCADE,
        data        TEXT NOT NULL DEFAULT '{}',
        status      TEXT NOT NULL DEFAULT 'draft',
        created_at  TEXT NOT NULL,
        created_by  TEXT NOT NULL DEFAULT '',
        updated_at  TEXT,
        updated_by  TEXT NOT NULL DEFAULT '',
        approved_at TEXT,
        approved_by TEXT NOT NULL DEFAULT '',
        rejected_at TEXT,
        rejected_by TEXT NOT NULL DEFAULT '',
        comments    TEXT NOT NULL DEFAULT ''
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_submissions_form
        ON submissions(form_id, created_at DESC);
    "#,
    // -- Dependencies --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS dependencies (
        id              TEXT PRIMARY KEY,
        source_form_id  TEXT NOT NULL,
        source_field_id TEXT NOT NULL,
        target_form_id  TEXT NOT NULL,
        target_field_id TEXT NOT NULL,
        kind            TEXT NOT NULL,
        expression      TEXT NOT NULL DEFAULT '',
        lookup_key      TEXT NOT NULL DEFAULT '',
        description     TEXT NOT NULL DEFAULT '',
        execution_order INTEGER NOT NULL DEFAULT 0,
        is_active       INTEGER NOT NULL DEFAULT 1,
        created_at      TEXT NOT NULL,
        created_by      TEXT NOT NULL DEFAULT '',
        updated_at      TEXT,
        updated_by      TEXT NOT NULL DEFAULT ''
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_dependencies_source
        ON dependencies(source_form_id);
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_dependencies_target
        ON dependencies(target_form_id);
    "#,
];
