//! Dependency CRUD and the persistent cycle guard for [`SqliteStore`].

use rusqlite::{Connection, Row, params};
use tracing::debug;

use phorm_core::dependency::FormDependency;
use phorm_core::graph;

use crate::error::{Result, StorageError};
use crate::sqlite::forms::offset;
use crate::sqlite::store::{SqliteStore, format_datetime, parse_datetime, parse_optional_datetime};
use crate::traits::Page;

const DEPENDENCY_COLUMNS: &str = "id, source_form_id, source_field_id, target_form_id, \
     target_field_id, kind, expression, lookup_key, description, execution_order, \
     is_active, created_at, created_by, updated_at, updated_by";

fn scan_dependency(row: &Row<'_>) -> rusqlite::Result<FormDependency> {
    let kind: String = row.get("kind")?;
    Ok(FormDependency {
        id: row.get("id")?,
        source_form_id: row.get("source_form_id")?,
        source_field_id: row.get("source_field_id")?,
        target_form_id: row.get("target_form_id")?,
        target_field_id: row.get("target_field_id")?,
        kind: kind.into(),
        expression: row.get("expression")?,
        lookup_key: row.get("lookup_key")?,
        description: row.get("description")?,
        execution_order: row.get("execution_order")?,
        is_active: row.get("is_active")?,
        created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        created_by: row.get("created_by")?,
        updated_at: parse_optional_datetime(row.get("updated_at")?),
        updated_by: row.get("updated_by")?,
    })
}

/// Loads every active dependency on the given connection.
fn active_dependencies_on_conn(conn: &Connection) -> Result<Vec<FormDependency>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {DEPENDENCY_COLUMNS} FROM dependencies WHERE is_active = 1 ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([], scan_dependency)?;
    let mut deps = Vec::new();
    for row in rows {
        deps.push(row?);
    }
    Ok(deps)
}

/// Rejects the candidate if its edge would close a cycle in the active
/// dependency graph. Runs while the caller holds the connection lock, so
/// check-then-insert is atomic with respect to other writers.
fn guard_acyclic(conn: &Connection, candidate: &FormDependency) -> Result<()> {
    let existing = active_dependencies_on_conn(conn)?;
    if graph::would_create_cycle(&existing, candidate) {
        debug!(
            source = %candidate.source_key(),
            target = %candidate.target_key(),
            "dependency rejected by cycle guard"
        );
        return Err(StorageError::CycleDetected);
    }
    Ok(())
}

impl SqliteStore {
    pub(crate) fn create_dependency_impl(&self, dependency: &FormDependency) -> Result<()> {
        let conn = self.lock_conn()?;
        guard_acyclic(&conn, dependency)?;

        conn.execute(
            "INSERT INTO dependencies
             (id, source_form_id, source_field_id, target_form_id, target_field_id,
              kind, expression, lookup_key, description, execution_order, is_active,
              created_at, created_by, updated_at, updated_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                dependency.id,
                dependency.source_form_id,
                dependency.source_field_id,
                dependency.target_form_id,
                dependency.target_field_id,
                dependency.kind.as_str(),
                dependency.expression,
                dependency.lookup_key,
                dependency.description,
                dependency.execution_order,
                dependency.is_active,
                format_datetime(&dependency.created_at),
                dependency.created_by,
                dependency.updated_at.as_ref().map(format_datetime),
                dependency.updated_by,
            ],
        )?;
        Ok(())
    }

    pub(crate) fn get_dependency_impl(&self, id: &str) -> Result<FormDependency> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {DEPENDENCY_COLUMNS} FROM dependencies WHERE id = ?1"
        ))?;
        stmt.query_row(params![id], scan_dependency)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("dependency", id),
                other => other.into(),
            })
    }

    pub(crate) fn update_dependency_impl(&self, dependency: &FormDependency) -> Result<()> {
        let conn = self.lock_conn()?;
        // `would_create_cycle` excludes the record's own previous edge by id.
        guard_acyclic(&conn, dependency)?;

        let affected = conn.execute(
            "UPDATE dependencies SET
                source_form_id = ?2, source_field_id = ?3,
                target_form_id = ?4, target_field_id = ?5,
                kind = ?6, expression = ?7, lookup_key = ?8, description = ?9,
                execution_order = ?10, is_active = ?11, updated_at = ?12, updated_by = ?13
             WHERE id = ?1",
            params![
                dependency.id,
                dependency.source_form_id,
                dependency.source_field_id,
                dependency.target_form_id,
                dependency.target_field_id,
                dependency.kind.as_str(),
                dependency.expression,
                dependency.lookup_key,
                dependency.description,
                dependency.execution_order,
                dependency.is_active,
                dependency.updated_at.as_ref().map(format_datetime),
                dependency.updated_by,
            ],
        )?;
        if affected == 0 {
            return Err(StorageError::not_found("dependency", &dependency.id));
        }
        Ok(())
    }

    pub(crate) fn delete_dependency_impl(&self, id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute("DELETE FROM dependencies WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StorageError::not_found("dependency", id));
        }
        Ok(())
    }

    pub(crate) fn list_dependencies_impl(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<FormDependency>> {
        let conn = self.lock_conn()?;
        let total: i64 =
            conn.query_row("SELECT COUNT(*) FROM dependencies", [], |row| row.get(0))?;

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {DEPENDENCY_COLUMNS} FROM dependencies
             ORDER BY execution_order, rowid LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![page_size, offset(page, page_size)], scan_dependency)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(Page { items, total })
    }

    pub(crate) fn dependencies_for_form_impl(&self, form_id: &str) -> Result<Vec<FormDependency>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {DEPENDENCY_COLUMNS} FROM dependencies
             WHERE source_form_id = ?1 OR target_form_id = ?1
             ORDER BY execution_order, rowid"
        ))?;
        let rows = stmt.query_map(params![form_id], scan_dependency)?;

        let mut deps = Vec::new();
        for row in rows {
            deps.push(row?);
        }
        Ok(deps)
    }

    pub(crate) fn active_dependencies_impl(&self) -> Result<Vec<FormDependency>> {
        let conn = self.lock_conn()?;
        active_dependencies_on_conn(&conn)
    }
}
