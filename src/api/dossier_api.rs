// ==========================================
// Dossier Technique - Dossier API
// ==========================================
// Transport-agnostic service surface over the assembly engine. DTOs keep
// dates as formatted strings and enums as their wire names so any
// transport can serialize them as-is.
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::dossier::{Dossier, DossierEntry, DossierSummary, DossierWithEntries};
use crate::engine::assembly::{
    ArtifactOutcome, CreateDossierRequest, DossierAssemblyEngine, MutationOutcome,
};
use crate::engine::batch::MutationBatch;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_dt(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

// ==========================================
// DTOs
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierInfo {
    pub dossier_id: String,
    pub project_id: String,
    pub name: String,
    pub version: i32,
    pub status: String,
    pub include_toc: bool,
    pub artifact_url: Option<String>,
    pub generated_at: Option<String>,
    pub created_at: String,
    pub modified_at: String,
}

impl From<Dossier> for DossierInfo {
    fn from(d: Dossier) -> Self {
        Self {
            dossier_id: d.dossier_id,
            project_id: d.project_id,
            name: d.name,
            version: d.version,
            status: d.status.to_string(),
            include_toc: d.include_toc,
            artifact_url: d.artifact_url,
            generated_at: d.generated_at.map(format_dt),
            created_at: format_dt(d.created_at),
            modified_at: format_dt(d.modified_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierEntryInfo {
    pub entry_id: String,
    pub sheet_id: String,
    pub reference_code: Option<String>,
    pub sheet_version: i32,
    pub inclusion_status: String,
    pub order_no: i32,
    pub replaces_sheet_id: Option<String>,
    pub subcontractor_id: Option<String>,
    pub remarks: Option<String>,
}

impl From<DossierEntry> for DossierEntryInfo {
    fn from(e: DossierEntry) -> Self {
        Self {
            entry_id: e.entry_id,
            sheet_id: e.sheet_id,
            reference_code: e.reference_code,
            sheet_version: e.sheet_version,
            inclusion_status: e.inclusion_status.to_string(),
            order_no: e.order_no,
            replaces_sheet_id: e.replaces_sheet_id,
            subcontractor_id: e.subcontractor_id,
            remarks: e.remarks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierDetail {
    pub dossier: DossierInfo,
    pub entries: Vec<DossierEntryInfo>,
}

impl From<DossierWithEntries> for DossierDetail {
    fn from(d: DossierWithEntries) -> Self {
        Self {
            dossier: d.dossier.into(),
            entries: d.entries.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierSummaryInfo {
    pub dossier_id: String,
    pub project_id: String,
    pub name: String,
    pub version: i32,
    pub status: String,
    pub artifact_url: Option<String>,
    pub generated_at: Option<String>,
    pub modified_at: String,
    pub entry_count: i64,
}

impl From<DossierSummary> for DossierSummaryInfo {
    fn from(s: DossierSummary) -> Self {
        Self {
            dossier_id: s.dossier_id,
            project_id: s.project_id,
            name: s.name,
            version: s.version,
            status: s.status.to_string(),
            artifact_url: s.artifact_url,
            generated_at: s.generated_at.map(format_dt),
            modified_at: format_dt(s.modified_at),
            entry_count: s.entry_count,
        }
    }
}

/// Save response. `regeneration_pending` is not an error: the entry
/// changes are committed and only the binary is missing until the caller
/// retries regenerate_artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierSaveResponse {
    pub dossier: DossierDetail,
    pub regeneration_pending: bool,
    pub regeneration_error: Option<String>,
}

impl From<MutationOutcome> for DossierSaveResponse {
    fn from(outcome: MutationOutcome) -> Self {
        let (pending, error) = match outcome.artifact {
            ArtifactOutcome::Generated { .. } => (false, None),
            ArtifactOutcome::Pending { reason } => (true, Some(reason)),
        };
        Self {
            dossier: outcome.dossier.into(),
            regeneration_pending: pending,
            regeneration_error: error,
        }
    }
}

// ==========================================
// DossierApi
// ==========================================

pub struct DossierApi {
    engine: Arc<DossierAssemblyEngine>,
}

impl DossierApi {
    pub fn new(engine: Arc<DossierAssemblyEngine>) -> Self {
        Self { engine }
    }

    fn require_non_empty(value: &str, field: &str) -> ApiResult<()> {
        if value.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!("{} must not be empty", field)));
        }
        Ok(())
    }

    pub async fn create_dossier(&self, request: CreateDossierRequest) -> ApiResult<DossierDetail> {
        Self::require_non_empty(&request.project_id, "project_id")?;
        Self::require_non_empty(&request.name, "name")?;
        let created = self.engine.create_dossier(request).await?;
        Ok(created.into())
    }

    /// Submit one mutation batch. The whole batch is rejected on any
    /// validation failure; on success the save may still report a pending
    /// regeneration.
    pub async fn mutate_dossier(
        &self,
        dossier_id: &str,
        batch: MutationBatch,
    ) -> ApiResult<DossierSaveResponse> {
        Self::require_non_empty(dossier_id, "dossier_id")?;
        if batch.is_empty() {
            return Err(ApiError::InvalidInput("empty mutation batch".to_string()));
        }
        let outcome = self.engine.mutate_dossier(dossier_id, batch).await?;
        Ok(outcome.into())
    }

    pub fn get_dossier(&self, dossier_id: &str) -> ApiResult<DossierDetail> {
        Ok(self.engine.get_dossier(dossier_id)?.into())
    }

    pub fn list_dossiers(&self, project_id: &str) -> ApiResult<Vec<DossierSummaryInfo>> {
        Self::require_non_empty(project_id, "project_id")?;
        Ok(self
            .engine
            .list_dossiers(project_id)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub fn delete_dossier(&self, dossier_id: &str) -> ApiResult<()> {
        Ok(self.engine.delete_dossier(dossier_id)?)
    }

    /// Pure regeneration from the current entry list; no entry changes.
    pub async fn regenerate_artifact(&self, dossier_id: &str) -> ApiResult<String> {
        let artifact = self.engine.regenerate_artifact(dossier_id).await?;
        Ok(artifact.url)
    }

    /// Download the binary, regenerating when storage evicted it.
    pub async fn fetch_artifact(&self, dossier_id: &str) -> ApiResult<Vec<u8>> {
        Ok(self.engine.fetch_artifact(dossier_id).await?)
    }

    pub fn mark_sent(&self, dossier_id: &str) -> ApiResult<DossierInfo> {
        Ok(self.engine.mark_sent(dossier_id)?.into())
    }
}
