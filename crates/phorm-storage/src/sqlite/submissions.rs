//! Submission CRUD for [`SqliteStore`].

use rusqlite::{Row, params};

use phorm_core::document::FormDocument;
use phorm_core::submission::FormSubmission;

use crate::error::{Result, StorageError};
use crate::sqlite::forms::offset;
use crate::sqlite::store::{SqliteStore, format_datetime, parse_datetime, parse_optional_datetime};
use crate::traits::Page;

const SUBMISSION_COLUMNS: &str = "id, form_id, data, status, created_at, created_by, \
     updated_at, updated_by, approved_at, approved_by, rejected_at, rejected_by, comments";

fn scan_submission(row: &Row<'_>) -> rusqlite::Result<FormSubmission> {
    let data: String = row.get("data")?;
    let status: String = row.get("status")?;
    Ok(FormSubmission {
        id: row.get("id")?,
        form_id: row.get("form_id")?,
        data: FormDocument::from_json_str(&data).unwrap_or_default(),
        status: status.into(),
        created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        created_by: row.get("created_by")?,
        updated_at: parse_optional_datetime(row.get("updated_at")?),
        updated_by: row.get("updated_by")?,
        approved_at: parse_optional_datetime(row.get("approved_at")?),
        approved_by: row.get("approved_by")?,
        rejected_at: parse_optional_datetime(row.get("rejected_at")?),
        rejected_by: row.get("rejected_by")?,
        comments: row.get("comments")?,
    })
}

impl SqliteStore {
    pub(crate) fn create_submission_impl(&self, submission: &FormSubmission) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO submissions
             (id, form_id, data, status, created_at, created_by, updated_at, updated_by,
              approved_at, approved_by, rejected_at, rejected_by, comments)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                submission.id,
                submission.form_id,
                serde_json::to_string(&submission.data)?,
                submission.status.as_str(),
                format_datetime(&submission.created_at),
                submission.created_by,
                submission.updated_at.as_ref().map(format_datetime),
                submission.updated_by,
                submission.approved_at.as_ref().map(format_datetime),
                submission.approved_by,
                submission.rejected_at.as_ref().map(format_datetime),
                submission.rejected_by,
                submission.comments,
            ],
        )?;
        Ok(())
    }

    pub(crate) fn get_submission_impl(&self, id: &str) -> Result<FormSubmission> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"
        ))?;
        stmt.query_row(params![id], scan_submission)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("submission", id),
                other => other.into(),
            })
    }

    pub(crate) fn update_submission_impl(&self, submission: &FormSubmission) -> Result<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute(
            "UPDATE submissions SET
                data = ?2, status = ?3, updated_at = ?4, updated_by = ?5,
                approved_at = ?6, approved_by = ?7, rejected_at = ?8, rejected_by = ?9,
                comments = ?10
             WHERE id = ?1",
            params![
                submission.id,
                serde_json::to_string(&submission.data)?,
                submission.status.as_str(),
                submission.updated_at.as_ref().map(format_datetime),
                submission.updated_by,
                submission.approved_at.as_ref().map(format_datetime),
                submission.approved_by,
                submission.rejected_at.as_ref().map(format_datetime),
                submission.rejected_by,
                submission.comments,
            ],
        )?;
        if affected == 0 {
            return Err(StorageError::not_found("submission", &submission.id));
        }
        Ok(())
    }

    pub(crate) fn delete_submission_impl(&self, id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute("DELETE FROM submissions WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StorageError::not_found("submission", id));
        }
        Ok(())
    }

    pub(crate) fn list_submissions_impl(
        &self,
        form_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<FormSubmission>> {
        let conn = self.lock_conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM submissions WHERE form_id = ?1",
            params![form_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE form_id = ?1
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(
            params![form_id, page_size, offset(page, page_size)],
            scan_submission,
        )?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(Page { items, total })
    }

    pub(crate) fn latest_submission_impl(&self, form_id: &str) -> Result<Option<FormSubmission>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE form_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))?;
        match stmt.query_row(params![form_id], scan_submission) {
            Ok(submission) => Ok(Some(submission)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
