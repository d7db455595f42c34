//! Form definition CRUD for [`SqliteStore`].

use rusqlite::{Row, params};

use phorm_core::form::FormDefinition;

use crate::error::{Result, StorageError};
use crate::sqlite::store::{SqliteStore, format_datetime, parse_datetime, parse_optional_datetime};
use crate::traits::Page;

const FORM_COLUMNS: &str = "id, name, description, version, is_published, direction, \
     sections, metadata, created_at, created_by, updated_at, updated_by";

pub(crate) fn scan_form(row: &Row<'_>) -> rusqlite::Result<FormDefinition> {
    let sections: String = row.get("sections")?;
    let metadata: String = row.get("metadata")?;
    Ok(FormDefinition {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        version: row.get("version")?,
        is_published: row.get("is_published")?,
        direction: row.get("direction")?,
        sections: serde_json::from_str(&sections).unwrap_or_default(),
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
        created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        created_by: row.get("created_by")?,
        updated_at: parse_optional_datetime(row.get("updated_at")?),
        updated_by: row.get("updated_by")?,
    })
}

impl SqliteStore {
    pub(crate) fn create_form_impl(&self, form: &FormDefinition) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO forms
             (id, name, description, version, is_published, direction,
              sections, metadata, created_at, created_by, updated_at, updated_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                form.id,
                form.name,
                form.description,
                form.version,
                form.is_published,
                form.direction,
                serde_json::to_string(&form.sections)?,
                serde_json::to_string(&form.metadata)?,
                format_datetime(&form.created_at),
                form.created_by,
                form.updated_at.as_ref().map(format_datetime),
                form.updated_by,
            ],
        )?;
        Ok(())
    }

    pub(crate) fn get_form_impl(&self, id: &str) -> Result<FormDefinition> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {FORM_COLUMNS} FROM forms WHERE id = ?1"
        ))?;
        stmt.query_row(params![id], scan_form)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("form", id),
                other => other.into(),
            })
    }

    pub(crate) fn update_form_impl(&self, form: &FormDefinition) -> Result<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute(
            "UPDATE forms SET
                name = ?2, description = ?3, version = ?4, is_published = ?5,
                direction = ?6, sections = ?7, metadata = ?8,
                updated_at = ?9, updated_by = ?10
             WHERE id = ?1",
            params![
                form.id,
                form.name,
                form.description,
                form.version,
                form.is_published,
                form.direction,
                serde_json::to_string(&form.sections)?,
                serde_json::to_string(&form.metadata)?,
                form.updated_at.as_ref().map(format_datetime),
                form.updated_by,
            ],
        )?;
        if affected == 0 {
            return Err(StorageError::not_found("form", &form.id));
        }
        Ok(())
    }

    pub(crate) fn delete_form_impl(&self, id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute("DELETE FROM forms WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StorageError::not_found("form", id));
        }
        Ok(())
    }

    pub(crate) fn list_forms_impl(&self, page: u32, page_size: u32) -> Result<Page<FormDefinition>> {
        let conn = self.lock_conn()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM forms", [], |row| row.get(0))?;

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {FORM_COLUMNS} FROM forms ORDER BY name LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![page_size, offset(page, page_size)], scan_form)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(Page { items, total })
    }

    pub(crate) fn search_forms_impl(
        &self,
        term: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<FormDefinition>> {
        let conn = self.lock_conn()?;
        let pattern = format!("%{term}%");
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM forms WHERE name LIKE ?1 OR description LIKE ?1",
            params![pattern],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {FORM_COLUMNS} FROM forms
             WHERE name LIKE ?1 OR description LIKE ?1
             ORDER BY name LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(
            params![pattern, page_size, offset(page, page_size)],
            scan_form,
        )?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(Page { items, total })
    }
}

/// Converts a 1-based page number into a row offset.
pub(crate) fn offset(page: u32, page_size: u32) -> u32 {
    page.saturating_sub(1) * page_size
}
