// ==========================================
// Dossier Technique - Dossier Assembly Engine
// ==========================================
// Core state-transition surface of the dossier subsystem:
// - creation from a catalog selection (all-or-nothing with generation)
// - batched mutation (removals -> status/field updates -> replacements ->
//   additions -> order re-pack -> persist -> preference sync -> regenerate)
// - standalone artifact regeneration from the current entry list
//
// Save and regenerate are deliberately two phases: a mutation batch is
// committed before the artifact is rendered, and a render failure leaves
// the committed entries in place with regeneration pending. Creation is
// the opposite: nothing is persisted unless generation succeeded.
// ==========================================

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::dossier::{derive_dossier_status, Dossier, DossierEntry, DossierSummary, DossierWithEntries};
use crate::domain::preference::SheetPreference;
use crate::domain::types::{DossierStatus, InclusionStatus};
use crate::engine::artifact::{ArtifactGenerator, GeneratedArtifact};
use crate::engine::batch::MutationBatch;
use crate::engine::error::{EngineError, EngineResult, GenerationError};
use crate::external::catalog::CatalogIndex;
use crate::external::storage::{FileStorage, StorageError};
use crate::repository::dossier_repo::DossierRepository;
use crate::repository::preference_repo::PreferenceRepository;

// ==========================================
// Requests / outcomes
// ==========================================

/// Per-sheet override supplied with a creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetSelectionOverride {
    pub reference_code: Option<String>,
    pub inclusion_status: Option<InclusionStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDossierRequest {
    pub project_id: String,
    pub name: String,
    /// Selection order becomes rendering order.
    pub sheet_ids: Vec<String>,
    /// Keyed by sheet_id; absent sheets default to DRAFT.
    #[serde(default)]
    pub overrides: HashMap<String, SheetSelectionOverride>,
    /// None falls back to the engine default.
    pub include_toc: Option<bool>,
}

/// Artifact side of a mutation outcome. Pending means the entry changes
/// are committed but the binary could not be rendered; the caller must
/// retry regenerate_artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ArtifactOutcome {
    Generated { url: String },
    Pending { reason: String },
}

#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub dossier: DossierWithEntries,
    pub artifact: ArtifactOutcome,
}

// ==========================================
// DossierAssemblyEngine
// ==========================================

pub struct DossierAssemblyEngine {
    dossier_repo: Arc<DossierRepository>,
    preference_repo: Arc<PreferenceRepository>,
    catalog: Arc<dyn CatalogIndex>,
    storage: Arc<dyn FileStorage>,
    generator: ArtifactGenerator,
    include_toc_default: bool,
}

impl DossierAssemblyEngine {
    pub fn new(
        dossier_repo: Arc<DossierRepository>,
        preference_repo: Arc<PreferenceRepository>,
        catalog: Arc<dyn CatalogIndex>,
        storage: Arc<dyn FileStorage>,
        generator: ArtifactGenerator,
        include_toc_default: bool,
    ) -> Self {
        Self {
            dossier_repo,
            preference_repo,
            catalog,
            storage,
            generator,
            include_toc_default,
        }
    }

    fn now() -> NaiveDateTime {
        chrono::Utc::now().naive_utc()
    }

    async fn require_known_sheet(&self, sheet_id: &str) -> EngineResult<()> {
        let known = self
            .catalog
            .get_sheet(sheet_id)
            .await
            .map_err(|e| EngineError::CatalogUnavailable(e.to_string()))?
            .is_some();
        if known {
            Ok(())
        } else {
            Err(EngineError::UnknownSheet {
                sheet_id: sheet_id.to_string(),
            })
        }
    }

    // ==========================================
    // creation
    // ==========================================

    /// Create a dossier from a non-empty selection of catalog sheets.
    ///
    /// All-or-nothing: the artifact is generated before anything is
    /// persisted, so a render or storage failure leaves no trace.
    pub async fn create_dossier(
        &self,
        request: CreateDossierRequest,
    ) -> EngineResult<DossierWithEntries> {
        if request.sheet_ids.is_empty() {
            return Err(EngineError::EmptySelection);
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for sheet_id in &request.sheet_ids {
            if !seen.insert(sheet_id.as_str()) {
                return Err(EngineError::DuplicateSheet {
                    sheet_id: sheet_id.clone(),
                });
            }
            self.require_known_sheet(sheet_id).await?;
        }

        let preferences = self.preference_repo.get_for_project(&request.project_id)?;
        let now = Self::now();
        let dossier_id = Uuid::new_v4().to_string();

        let entries: Vec<DossierEntry> = request
            .sheet_ids
            .iter()
            .enumerate()
            .map(|(idx, sheet_id)| {
                let over = request.overrides.get(sheet_id);
                let pref = preferences.get(sheet_id);
                DossierEntry {
                    entry_id: Uuid::new_v4().to_string(),
                    dossier_id: dossier_id.clone(),
                    sheet_id: sheet_id.clone(),
                    reference_code: over
                        .and_then(|o| o.reference_code.clone())
                        .or_else(|| pref.and_then(|p| p.reference_code.clone())),
                    sheet_version: 1,
                    inclusion_status: over
                        .and_then(|o| o.inclusion_status)
                        .unwrap_or(InclusionStatus::Draft),
                    order_no: idx as i32,
                    replaces_sheet_id: None,
                    subcontractor_id: pref.and_then(|p| p.subcontractor_id.clone()),
                    remarks: pref.and_then(|p| p.remarks.clone()),
                }
            })
            .collect();

        let mut dossier = Dossier {
            dossier_id: dossier_id.clone(),
            project_id: request.project_id.clone(),
            name: request.name.clone(),
            version: 1,
            status: derive_dossier_status(&entries),
            include_toc: request.include_toc.unwrap_or(self.include_toc_default),
            artifact_url: None,
            generated_at: None,
            created_at: now,
            modified_at: now,
        };

        // Generation first; nothing is persisted when it fails.
        let artifact = self.generator.generate(&dossier, &entries).await?;
        dossier.artifact_url = Some(artifact.url);
        dossier.generated_at = Some(artifact.generated_at);

        self.dossier_repo.insert_with_entries(&dossier, &entries)?;
        info!(
            dossier_id = %dossier_id,
            project_id = %request.project_id,
            entries = entries.len(),
            "dossier created"
        );
        Ok(DossierWithEntries { dossier, entries })
    }

    // ==========================================
    // batched mutation
    // ==========================================

    /// Apply one mutation batch to an existing dossier.
    ///
    /// Validation failures reject the whole batch, leaving the dossier
    /// untouched. Once the new entry set is committed, a regeneration
    /// failure is reported as `ArtifactOutcome::Pending` instead of being
    /// rolled back.
    pub async fn mutate_dossier(
        &self,
        dossier_id: &str,
        batch: MutationBatch,
    ) -> EngineResult<MutationOutcome> {
        let loaded = self
            .dossier_repo
            .find_with_entries(dossier_id)?
            .ok_or_else(|| EngineError::DossierNotFound {
                dossier_id: dossier_id.to_string(),
            })?;
        let mut dossier = loaded.dossier;
        let mut entries = loaded.entries;
        let mut touched: HashSet<String> = HashSet::new();

        // Step 1: removals. Frees the removed sheet ids for reuse later
        // in the same batch.
        let removals: HashSet<&String> = batch.removals.iter().collect();
        for entry_id in &removals {
            if !entries.iter().any(|e| &e.entry_id == *entry_id) {
                return Err(EngineError::UnknownEntry {
                    entry_id: (*entry_id).clone(),
                });
            }
        }
        entries.retain(|e| !removals.contains(&e.entry_id));

        // Step 2: status changes and field patches on remaining entries.
        // Edits aimed at an entry removed in step 1 are batch errors.
        for (entry_id, status) in &batch.status_changes {
            let entry = Self::entry_mut(&mut entries, entry_id)?;
            entry.inclusion_status = *status;
            touched.insert(entry_id.clone());
        }
        for (entry_id, patch) in &batch.field_patches {
            let entry = Self::entry_mut(&mut entries, entry_id)?;
            patch.apply(entry);
            touched.insert(entry_id.clone());
        }

        // Step 3: replacements, in ascending order of the target entry's
        // position so the batch is deterministic.
        let mut replacements: Vec<(&String, &String)> = batch.replacements.iter().collect();
        replacements.sort_by_key(|(entry_id, _)| {
            entries
                .iter()
                .find(|e| &e.entry_id == *entry_id)
                .map(|e| e.order_no)
                .unwrap_or(i32::MAX)
        });
        for (entry_id, new_sheet_id) in replacements {
            let position = entries
                .iter()
                .position(|e| &e.entry_id == entry_id)
                .ok_or_else(|| EngineError::UnknownEntry {
                    entry_id: entry_id.clone(),
                })?;
            if !entries[position].is_replaceable() {
                return Err(EngineError::InvalidReplacementState {
                    entry_id: entry_id.clone(),
                    status: entries[position].inclusion_status,
                });
            }
            self.require_known_sheet(new_sheet_id).await?;
            if entries.iter().any(|e| &e.sheet_id == new_sheet_id) {
                return Err(EngineError::DuplicateSheet {
                    sheet_id: new_sheet_id.clone(),
                });
            }
            // Retire the old entry, create its successor in place. Fields
            // carry forward (step-2 patches included); the supersession
            // back-pointer preserves the audit chain.
            let old = entries[position].clone();
            touched.remove(&old.entry_id);
            let successor = DossierEntry {
                entry_id: Uuid::new_v4().to_string(),
                dossier_id: dossier.dossier_id.clone(),
                sheet_id: new_sheet_id.clone(),
                reference_code: old.reference_code,
                sheet_version: old.sheet_version + 1,
                inclusion_status: InclusionStatus::Draft,
                order_no: old.order_no,
                replaces_sheet_id: Some(old.sheet_id),
                subcontractor_id: old.subcontractor_id,
                remarks: old.remarks,
            };
            touched.insert(successor.entry_id.clone());
            entries[position] = successor;
        }

        // Step 4: additions, appended in request order and seeded from
        // the Preference Store for fields not supplied.
        if !batch.additions.is_empty() {
            let preferences = self.preference_repo.get_for_project(&dossier.project_id)?;
            let mut next_order = entries.iter().map(|e| e.order_no + 1).max().unwrap_or(0);
            for addition in &batch.additions {
                self.require_known_sheet(&addition.sheet_id).await?;
                if entries.iter().any(|e| e.sheet_id == addition.sheet_id) {
                    return Err(EngineError::DuplicateSheet {
                        sheet_id: addition.sheet_id.clone(),
                    });
                }
                let pref = preferences.get(&addition.sheet_id);
                let entry = DossierEntry {
                    entry_id: Uuid::new_v4().to_string(),
                    dossier_id: dossier.dossier_id.clone(),
                    sheet_id: addition.sheet_id.clone(),
                    reference_code: addition
                        .reference_code
                        .clone()
                        .or_else(|| pref.and_then(|p| p.reference_code.clone())),
                    sheet_version: 1,
                    inclusion_status: addition.inclusion_status.unwrap_or(InclusionStatus::Draft),
                    order_no: next_order,
                    replaces_sheet_id: None,
                    subcontractor_id: addition
                        .subcontractor_id
                        .clone()
                        .or_else(|| pref.and_then(|p| p.subcontractor_id.clone())),
                    remarks: addition
                        .remarks
                        .clone()
                        .or_else(|| pref.and_then(|p| p.remarks.clone())),
                };
                touched.insert(entry.entry_id.clone());
                entries.push(entry);
                next_order += 1;
            }
        }

        // Step 5: dense re-pack of the rendering order.
        entries.sort_by_key(|e| e.order_no);
        for (idx, entry) in entries.iter_mut().enumerate() {
            entry.order_no = idx as i32;
        }

        // Step 6: persist the post-mutation state in one transaction.
        let now = Self::now();
        dossier.version += 1;
        dossier.status = derive_dossier_status(&entries);
        dossier.modified_at = now;
        self.dossier_repo.save_mutation(&dossier, &entries)?;

        // Step 7: preference write-through for every entry this batch
        // touched, so future selections default to the latest choices.
        // Independent of the dossier transaction; last write wins.
        for entry in entries.iter().filter(|e| touched.contains(&e.entry_id)) {
            self.preference_repo.upsert(&SheetPreference {
                project_id: dossier.project_id.clone(),
                sheet_id: entry.sheet_id.clone(),
                subcontractor_id: entry.subcontractor_id.clone(),
                reference_code: entry.reference_code.clone(),
                remarks: entry.remarks.clone(),
                updated_at: now,
            })?;
        }

        // Step 8: regenerate. The committed entry changes stand even when
        // rendering fails; the caller retries regenerate_artifact.
        let artifact = match self.generator.generate(&dossier, &entries).await {
            Ok(GeneratedArtifact { url, generated_at }) => {
                self.dossier_repo
                    .update_artifact(&dossier.dossier_id, &url, generated_at)?;
                dossier.artifact_url = Some(url.clone());
                dossier.generated_at = Some(generated_at);
                ArtifactOutcome::Generated { url }
            }
            Err(e) => {
                warn!(
                    dossier_id = %dossier.dossier_id,
                    error = %e,
                    "entry changes committed but artifact regeneration failed"
                );
                ArtifactOutcome::Pending {
                    reason: e.to_string(),
                }
            }
        };

        info!(
            dossier_id = %dossier.dossier_id,
            version = dossier.version,
            entries = entries.len(),
            "dossier mutation committed"
        );
        Ok(MutationOutcome {
            dossier: DossierWithEntries { dossier, entries },
            artifact,
        })
    }

    fn entry_mut<'a>(
        entries: &'a mut [DossierEntry],
        entry_id: &str,
    ) -> EngineResult<&'a mut DossierEntry> {
        entries
            .iter_mut()
            .find(|e| e.entry_id == entry_id)
            .ok_or_else(|| EngineError::UnknownEntry {
                entry_id: entry_id.to_string(),
            })
    }

    // ==========================================
    // regeneration & retrieval
    // ==========================================

    /// Rebuild the artifact from the current entry list. No entry changes
    /// occur on this path; the previous binary is not required.
    pub async fn regenerate_artifact(&self, dossier_id: &str) -> EngineResult<GeneratedArtifact> {
        let loaded = self
            .dossier_repo
            .find_with_entries(dossier_id)?
            .ok_or_else(|| EngineError::DossierNotFound {
                dossier_id: dossier_id.to_string(),
            })?;
        let artifact = self
            .generator
            .generate(&loaded.dossier, &loaded.entries)
            .await?;
        self.dossier_repo
            .update_artifact(dossier_id, &artifact.url, artifact.generated_at)?;
        Ok(artifact)
    }

    /// Download the stored binary, regenerating transparently when the
    /// storage evicted it. Artifact-missing is never a hard failure.
    pub async fn fetch_artifact(&self, dossier_id: &str) -> EngineResult<Vec<u8>> {
        let dossier = self
            .dossier_repo
            .find_by_id(dossier_id)?
            .ok_or_else(|| EngineError::DossierNotFound {
                dossier_id: dossier_id.to_string(),
            })?;

        if let Some(url) = &dossier.artifact_url {
            match self.storage.fetch(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(StorageError::NotFound { .. }) => {
                    warn!(dossier_id, url = %url, "stored artifact missing, regenerating");
                }
                Err(e) => return Err(GenerationError::Storage(e.to_string()).into()),
            }
        }

        let regenerated = self.regenerate_artifact(dossier_id).await?;
        self.storage
            .fetch(&regenerated.url)
            .await
            .map_err(|e| GenerationError::Storage(e.to_string()).into())
    }

    pub fn get_dossier(&self, dossier_id: &str) -> EngineResult<DossierWithEntries> {
        self.dossier_repo
            .find_with_entries(dossier_id)?
            .ok_or_else(|| EngineError::DossierNotFound {
                dossier_id: dossier_id.to_string(),
            })
    }

    pub fn list_dossiers(&self, project_id: &str) -> EngineResult<Vec<DossierSummary>> {
        Ok(self.dossier_repo.list_by_project(project_id)?)
    }

    /// Delete one dossier. Entries cascade; sheet preferences are
    /// independent default state and survive.
    pub fn delete_dossier(&self, dossier_id: &str) -> EngineResult<()> {
        match self.dossier_repo.delete(dossier_id) {
            Ok(()) => {
                info!(dossier_id, "dossier deleted");
                Ok(())
            }
            Err(crate::repository::error::RepositoryError::NotFound { .. }) => {
                Err(EngineError::DossierNotFound {
                    dossier_id: dossier_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Explicit DRAFT -> SENT transition. Any later mutation re-derives
    /// the status from entry feedback.
    pub fn mark_sent(&self, dossier_id: &str) -> EngineResult<Dossier> {
        let mut dossier = self
            .dossier_repo
            .find_by_id(dossier_id)?
            .ok_or_else(|| EngineError::DossierNotFound {
                dossier_id: dossier_id.to_string(),
            })?;
        let now = Self::now();
        self.dossier_repo
            .update_status(dossier_id, DossierStatus::Sent, now)?;
        dossier.status = DossierStatus::Sent;
        dossier.modified_at = now;
        Ok(dossier)
    }
}
