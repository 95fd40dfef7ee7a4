// ==========================================
// Dossier Technique - Preference API
// ==========================================
// Per-project, per-sheet default overrides plus the subcontractor
// directory the preference screens pick from. Writes go through
// immediately and independently of any dossier transaction.
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::catalog::Subcontractor;
use crate::domain::preference::SheetPreference;
use crate::domain::types::PreferenceField;
use crate::external::directory::SubcontractorDirectory;
use crate::repository::preference_repo::PreferenceRepository;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceInfo {
    pub sheet_id: String,
    pub subcontractor_id: Option<String>,
    pub reference_code: Option<String>,
    pub remarks: Option<String>,
    pub updated_at: String,
}

impl From<SheetPreference> for PreferenceInfo {
    fn from(p: SheetPreference) -> Self {
        Self {
            sheet_id: p.sheet_id,
            subcontractor_id: p.subcontractor_id,
            reference_code: p.reference_code,
            remarks: p.remarks,
            updated_at: p.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubcontractorInfo {
    pub subcontractor_id: String,
    pub name: String,
}

impl From<Subcontractor> for SubcontractorInfo {
    fn from(s: Subcontractor) -> Self {
        Self {
            subcontractor_id: s.subcontractor_id,
            name: s.name,
        }
    }
}

pub struct PreferenceApi {
    repo: Arc<PreferenceRepository>,
    directory: Arc<dyn SubcontractorDirectory>,
}

impl PreferenceApi {
    pub fn new(repo: Arc<PreferenceRepository>, directory: Arc<dyn SubcontractorDirectory>) -> Self {
        Self { repo, directory }
    }

    pub fn get_preferences(&self, project_id: &str) -> ApiResult<HashMap<String, PreferenceInfo>> {
        if project_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("project_id must not be empty".to_string()));
        }
        Ok(self
            .repo
            .get_for_project(project_id)?
            .into_iter()
            .map(|(sheet_id, pref)| (sheet_id, pref.into()))
            .collect())
    }

    /// Set one preference field. An empty or whitespace value clears the
    /// field. Durable before returning.
    pub fn set_preference(
        &self,
        project_id: &str,
        sheet_id: &str,
        field: PreferenceField,
        value: Option<&str>,
    ) -> ApiResult<()> {
        if project_id.trim().is_empty() || sheet_id.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "project_id and sheet_id must not be empty".to_string(),
            ));
        }
        let normalized = value.map(str::trim).filter(|v| !v.is_empty());
        let now = chrono::Utc::now().naive_utc();
        self.repo
            .set_field(project_id, sheet_id, field, normalized, now)?;
        Ok(())
    }

    pub async fn list_active_subcontractors(&self) -> ApiResult<Vec<SubcontractorInfo>> {
        let active = self
            .directory
            .list_active()
            .await
            .map_err(|e| ApiError::CollaboratorUnavailable(e.to_string()))?;
        Ok(active.into_iter().map(Into::into).collect())
    }
}
