// ==========================================
// Dossier Technique - Sheet Preference Repository
// ==========================================
// Per-(project, sheet) default overrides: assigned subcontractor,
// reference code, remarks. Write-through store, independent of any
// dossier transaction:
// - created lazily on first edit, updated in place afterwards
// - never deleted automatically; survives dossier deletion
// - last write wins per (project_id, sheet_id) key
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult};

use crate::domain::preference::SheetPreference;
use crate::domain::types::PreferenceField;
use crate::repository::error::{RepositoryError, RepositoryResult};

pub struct PreferenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PreferenceRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_tables()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        let repo = Self { conn };
        repo.ensure_tables()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_tables(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sheet_preference (
              project_id TEXT NOT NULL,
              sheet_id TEXT NOT NULL,
              subcontractor_id TEXT,
              reference_code TEXT,
              remarks TEXT,
              updated_at TEXT NOT NULL,
              PRIMARY KEY (project_id, sheet_id)
            );
            "#,
        )?;
        Ok(())
    }

    /// All preferences of one project, keyed by sheet id.
    pub fn get_for_project(
        &self,
        project_id: &str,
    ) -> RepositoryResult<HashMap<String, SheetPreference>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT project_id, sheet_id, subcontractor_id, reference_code, remarks, updated_at
            FROM sheet_preference
            WHERE project_id = ?1
            "#,
        )?;
        let rows = stmt
            .query_map(params![project_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .map(|p| (p.sheet_id.clone(), p))
            .collect())
    }

    pub fn find(
        &self,
        project_id: &str,
        sheet_id: &str,
    ) -> RepositoryResult<Option<SheetPreference>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT project_id, sheet_id, subcontractor_id, reference_code, remarks, updated_at
            FROM sheet_preference
            WHERE project_id = ?1 AND sheet_id = ?2
            "#,
        )?;
        let result = stmt.query_row(params![project_id, sheet_id], Self::map_row);
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set one field, creating the row lazily. Durable before returning.
    pub fn set_field(
        &self,
        project_id: &str,
        sheet_id: &str,
        field: PreferenceField,
        value: Option<&str>,
        now: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let column = match field {
            PreferenceField::SubcontractorId => "subcontractor_id",
            PreferenceField::ReferenceCode => "reference_code",
            PreferenceField::Remarks => "remarks",
        };
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            INSERT INTO sheet_preference (project_id, sheet_id, {column}, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(project_id, sheet_id) DO UPDATE SET
                {column} = excluded.{column},
                updated_at = excluded.updated_at
            "#,
        );
        conn.execute(&sql, params![project_id, sheet_id, value, now])?;
        Ok(())
    }

    /// Full-row write-through, used by the mutation preference sync so
    /// future selections default to the latest choices.
    pub fn upsert(&self, pref: &SheetPreference) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sheet_preference (
                project_id, sheet_id, subcontractor_id, reference_code, remarks, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(project_id, sheet_id) DO UPDATE SET
                subcontractor_id = excluded.subcontractor_id,
                reference_code = excluded.reference_code,
                remarks = excluded.remarks,
                updated_at = excluded.updated_at
            "#,
            params![
                pref.project_id,
                pref.sheet_id,
                pref.subcontractor_id,
                pref.reference_code,
                pref.remarks,
                pref.updated_at,
            ],
        )?;
        Ok(())
    }

    fn map_row(row: &rusqlite::Row<'_>) -> SqliteResult<SheetPreference> {
        Ok(SheetPreference {
            project_id: row.get(0)?,
            sheet_id: row.get(1)?,
            subcontractor_id: row.get(2)?,
            reference_code: row.get(3)?,
            remarks: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}
