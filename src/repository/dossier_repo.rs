// ==========================================
// Dossier Technique - Dossier Repository
// ==========================================
// Responsibilities:
// - durable storage of dossier rows and their ordered entry lists
// - batch persistence of a post-mutation entry set in one transaction
// Notes:
// - sheet_id / replaces_sheet_id are soft references into the external
//   catalog; no foreign key is declared on them
// - dossier_entry cascades on dossier deletion; sheet preferences are a
//   separate store and are never cascaded
// ==========================================

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult};

use crate::domain::dossier::{Dossier, DossierEntry, DossierSummary, DossierWithEntries};
use crate::domain::types::{DossierStatus, InclusionStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};

// Raw row shapes; status strings are parsed into enums outside the
// rusqlite closures so parse failures surface as ValidationError.
type DossierRow = (
    String,
    String,
    String,
    i32,
    String,
    bool,
    Option<String>,
    Option<NaiveDateTime>,
    NaiveDateTime,
    NaiveDateTime,
);
type EntryRow = (
    String,
    String,
    String,
    Option<String>,
    i32,
    String,
    i32,
    Option<String>,
    Option<String>,
    Option<String>,
);

pub struct DossierRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DossierRepository {
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
            CREATE TABLE IF NOT EXISTS dossier (
              dossier_id TEXT PRIMARY KEY,
              project_id TEXT NOT NULL,
              name TEXT NOT NULL,
              version INTEGER NOT NULL DEFAULT 1,
              status TEXT NOT NULL,
              include_toc INTEGER NOT NULL DEFAULT 1,
              artifact_url TEXT,
              generated_at TEXT,
              created_at TEXT NOT NULL,
              modified_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_dossier_project
              ON dossier(project_id);

            CREATE TABLE IF NOT EXISTS dossier_entry (
              entry_id TEXT PRIMARY KEY,
              dossier_id TEXT NOT NULL REFERENCES dossier(dossier_id) ON DELETE CASCADE,
              sheet_id TEXT NOT NULL,
              reference_code TEXT,
              sheet_version INTEGER NOT NULL DEFAULT 1,
              inclusion_status TEXT NOT NULL,
              order_no INTEGER NOT NULL,
              replaces_sheet_id TEXT,
              subcontractor_id TEXT,
              remarks TEXT,
              UNIQUE (dossier_id, sheet_id)
            );

            CREATE INDEX IF NOT EXISTS idx_dossier_entry_order
              ON dossier_entry(dossier_id, order_no);
            "#,
        )?;
        // Warning probe only; no automatic migration.
        if let Some(found) = crate::db::read_schema_version(&conn)? {
            if found != crate::db::CURRENT_SCHEMA_VERSION {
                tracing::warn!(
                    found,
                    expected = crate::db::CURRENT_SCHEMA_VERSION,
                    "database schema version differs from the one this build expects"
                );
            }
        }
        crate::db::stamp_schema_version(&conn)?;
        Ok(())
    }

    // ==========================================
    // writes
    // ==========================================

    /// Persist a freshly created dossier with its entries, atomically.
    pub fn insert_with_entries(
        &self,
        dossier: &Dossier,
        entries: &[DossierEntry],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO dossier (
                dossier_id, project_id, name, version, status, include_toc,
                artifact_url, generated_at, created_at, modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                dossier.dossier_id,
                dossier.project_id,
                dossier.name,
                dossier.version,
                dossier.status.to_string(),
                dossier.include_toc,
                dossier.artifact_url,
                dossier.generated_at,
                dossier.created_at,
                dossier.modified_at,
            ],
        )?;
        for entry in entries {
            Self::insert_entry(&tx, entry)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Persist the full post-mutation state of one dossier: the new entry
    /// set replaces the old one, and version/status/modified_at are
    /// updated, all in one transaction.
    pub fn save_mutation(
        &self,
        dossier: &Dossier,
        entries: &[DossierEntry],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let affected = tx.execute(
            r#"
            UPDATE dossier
            SET version = ?2, status = ?3, modified_at = ?4
            WHERE dossier_id = ?1
            "#,
            params![
                dossier.dossier_id,
                dossier.version,
                dossier.status.to_string(),
                dossier.modified_at,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Dossier".to_string(),
                id: dossier.dossier_id.clone(),
            });
        }
        tx.execute(
            "DELETE FROM dossier_entry WHERE dossier_id = ?1",
            params![dossier.dossier_id],
        )?;
        for entry in entries {
            Self::insert_entry(&tx, entry)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn insert_entry(conn: &Connection, entry: &DossierEntry) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO dossier_entry (
                entry_id, dossier_id, sheet_id, reference_code, sheet_version,
                inclusion_status, order_no, replaces_sheet_id, subcontractor_id, remarks
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                entry.entry_id,
                entry.dossier_id,
                entry.sheet_id,
                entry.reference_code,
                entry.sheet_version,
                entry.inclusion_status.to_string(),
                entry.order_no,
                entry.replaces_sheet_id,
                entry.subcontractor_id,
                entry.remarks,
            ],
        )?;
        Ok(())
    }

    /// Record the location and timestamp of a freshly generated artifact.
    pub fn update_artifact(
        &self,
        dossier_id: &str,
        artifact_url: &str,
        generated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE dossier
            SET artifact_url = ?2, generated_at = ?3
            WHERE dossier_id = ?1
            "#,
            params![dossier_id, artifact_url, generated_at],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Dossier".to_string(),
                id: dossier_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn update_status(
        &self,
        dossier_id: &str,
        status: DossierStatus,
        modified_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE dossier SET status = ?2, modified_at = ?3 WHERE dossier_id = ?1",
            params![dossier_id, status.to_string(), modified_at],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Dossier".to_string(),
                id: dossier_id.to_string(),
            });
        }
        Ok(())
    }

    /// Delete one dossier; entries cascade, preferences are untouched.
    pub fn delete(&self, dossier_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM dossier WHERE dossier_id = ?1",
            params![dossier_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Dossier".to_string(),
                id: dossier_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // reads
    // ==========================================

    pub fn find_by_id(&self, dossier_id: &str) -> RepositoryResult<Option<Dossier>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT dossier_id, project_id, name, version, status, include_toc,
                   artifact_url, generated_at, created_at, modified_at
            FROM dossier
            WHERE dossier_id = ?1
            "#,
        )?;
        let result = stmt.query_row(params![dossier_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, bool>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, Option<NaiveDateTime>>(7)?,
                row.get::<_, NaiveDateTime>(8)?,
                row.get::<_, NaiveDateTime>(9)?,
            ))
        });
        match result {
            Ok(raw) => Ok(Some(Self::dossier_from_row(raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Entries of one dossier, ordered for rendering.
    pub fn load_entries(&self, dossier_id: &str) -> RepositoryResult<Vec<DossierEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT entry_id, dossier_id, sheet_id, reference_code, sheet_version,
                   inclusion_status, order_no, replaces_sheet_id, subcontractor_id, remarks
            FROM dossier_entry
            WHERE dossier_id = ?1
            ORDER BY order_no ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![dossier_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i32>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i32>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, Option<String>>(9)?,
                ))
            })?
            .collect::<SqliteResult<Vec<EntryRow>>>()?;

        rows.into_iter().map(Self::entry_from_row).collect()
    }

    pub fn find_with_entries(
        &self,
        dossier_id: &str,
    ) -> RepositoryResult<Option<DossierWithEntries>> {
        let dossier = match self.find_by_id(dossier_id)? {
            Some(d) => d,
            None => return Ok(None),
        };
        let entries = self.load_entries(dossier_id)?;
        Ok(Some(DossierWithEntries { dossier, entries }))
    }

    /// Summary rows for one project, newest modification first.
    pub fn list_by_project(&self, project_id: &str) -> RepositoryResult<Vec<DossierSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT d.dossier_id, d.project_id, d.name, d.version, d.status,
                   d.artifact_url, d.generated_at, d.modified_at,
                   (SELECT COUNT(*) FROM dossier_entry e WHERE e.dossier_id = d.dossier_id)
            FROM dossier d
            WHERE d.project_id = ?1
            ORDER BY d.modified_at DESC, d.name ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i32>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<NaiveDateTime>>(6)?,
                    row.get::<_, NaiveDateTime>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        rows.into_iter()
            .map(|r| {
                Ok(DossierSummary {
                    dossier_id: r.0,
                    project_id: r.1,
                    name: r.2,
                    version: r.3,
                    status: Self::parse_dossier_status(&r.4)?,
                    artifact_url: r.5,
                    generated_at: r.6,
                    modified_at: r.7,
                    entry_count: r.8,
                })
            })
            .collect()
    }

    // ==========================================
    // row conversion
    // ==========================================

    fn parse_dossier_status(raw: &str) -> RepositoryResult<DossierStatus> {
        DossierStatus::from_str(raw).map_err(RepositoryError::ValidationError)
    }

    fn dossier_from_row(raw: DossierRow) -> RepositoryResult<Dossier> {
        Ok(Dossier {
            dossier_id: raw.0,
            project_id: raw.1,
            name: raw.2,
            version: raw.3,
            status: Self::parse_dossier_status(&raw.4)?,
            include_toc: raw.5,
            artifact_url: raw.6,
            generated_at: raw.7,
            created_at: raw.8,
            modified_at: raw.9,
        })
    }

    fn entry_from_row(raw: EntryRow) -> RepositoryResult<DossierEntry> {
        Ok(DossierEntry {
            entry_id: raw.0,
            dossier_id: raw.1,
            sheet_id: raw.2,
            reference_code: raw.3,
            sheet_version: raw.4,
            inclusion_status: InclusionStatus::from_str(&raw.5)
                .map_err(RepositoryError::ValidationError)?,
            order_no: raw.6,
            replaces_sheet_id: raw.7,
            subcontractor_id: raw.8,
            remarks: raw.9,
        })
    }
}
