// ==========================================
// Dossier Technique - Dossier Edit Session
// ==========================================
// Client-side buffering of pending edits against one open dossier. The
// session never touches the repository: it accumulates the five edit
// kinds over a snapshot of the entry list and flushes them as a single
// MutationBatch on save. Cancel discards everything.
//
// "Replace" is only offered when the entry's effective status - the
// locally buffered one when present, the snapshot one otherwise - is
// NEW_PROPOSAL. The engine re-checks on submit; the session check exists
// so the UI never offers an action the engine would reject.
// ==========================================

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::dossier::DossierWithEntries;
use crate::domain::types::InclusionStatus;
use crate::engine::batch::{EntryAddition, EntryFieldPatch, MutationBatch};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown entry in this dossier: {entry_id}")]
    UnknownEntry { entry_id: String },

    #[error("entry already marked for removal: {entry_id}")]
    AlreadyRemoved { entry_id: String },

    #[error("entry {entry_id} is not in NEW_PROPOSAL")]
    NotInNewProposal { entry_id: String },

    #[error("sheet already active or pending in this dossier: {sheet_id}")]
    DuplicateSheet { sheet_id: String },
}

/// Snapshot of one entry taken when the session was opened.
#[derive(Debug, Clone)]
struct EntrySnapshot {
    entry_id: String,
    sheet_id: String,
    inclusion_status: InclusionStatus,
}

pub struct DossierEditSession {
    dossier_id: String,
    snapshot: Vec<EntrySnapshot>,
    status_changes: HashMap<String, InclusionStatus>,
    replacements: HashMap<String, String>,
    field_patches: HashMap<String, EntryFieldPatch>,
    additions: Vec<EntryAddition>,
    removals: Vec<String>,
}

impl DossierEditSession {
    /// Open a session over a loaded dossier.
    pub fn open(dossier: &DossierWithEntries) -> Self {
        Self {
            dossier_id: dossier.dossier.dossier_id.clone(),
            snapshot: dossier
                .entries
                .iter()
                .map(|e| EntrySnapshot {
                    entry_id: e.entry_id.clone(),
                    sheet_id: e.sheet_id.clone(),
                    inclusion_status: e.inclusion_status,
                })
                .collect(),
            status_changes: HashMap::new(),
            replacements: HashMap::new(),
            field_patches: HashMap::new(),
            additions: Vec::new(),
            removals: Vec::new(),
        }
    }

    pub fn dossier_id(&self) -> &str {
        &self.dossier_id
    }

    fn snapshot_of(&self, entry_id: &str) -> Option<&EntrySnapshot> {
        self.snapshot.iter().find(|e| e.entry_id == entry_id)
    }

    fn require_editable(&self, entry_id: &str) -> Result<&EntrySnapshot, SessionError> {
        let snap = self
            .snapshot_of(entry_id)
            .ok_or_else(|| SessionError::UnknownEntry {
                entry_id: entry_id.to_string(),
            })?;
        if self.removals.iter().any(|r| r == entry_id) {
            return Err(SessionError::AlreadyRemoved {
                entry_id: entry_id.to_string(),
            });
        }
        Ok(snap)
    }

    /// Buffered status when present, snapshot status otherwise.
    pub fn effective_status(&self, entry_id: &str) -> Option<InclusionStatus> {
        self.status_changes
            .get(entry_id)
            .copied()
            .or_else(|| self.snapshot_of(entry_id).map(|e| e.inclusion_status))
    }

    /// Sheet ids that would be active after this session is saved:
    /// snapshot minus removals, replacement targets swapped for their
    /// picks, plus buffered additions.
    fn effective_sheet_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .snapshot
            .iter()
            .filter(|e| !self.removals.iter().any(|r| r == &e.entry_id))
            .map(|e| {
                self.replacements
                    .get(&e.entry_id)
                    .cloned()
                    .unwrap_or_else(|| e.sheet_id.clone())
            })
            .collect();
        ids.extend(self.additions.iter().map(|a| a.sheet_id.clone()));
        ids
    }

    // ==========================================
    // edits
    // ==========================================

    pub fn set_status(
        &mut self,
        entry_id: &str,
        status: InclusionStatus,
    ) -> Result<(), SessionError> {
        self.require_editable(entry_id)?;
        self.status_changes.insert(entry_id.to_string(), status);
        // A status leaving NEW_PROPOSAL invalidates a buffered pick.
        if status != InclusionStatus::NewProposal {
            self.replacements.remove(entry_id);
        }
        Ok(())
    }

    pub fn patch_fields(
        &mut self,
        entry_id: &str,
        patch: EntryFieldPatch,
    ) -> Result<(), SessionError> {
        self.require_editable(entry_id)?;
        if patch.is_empty() {
            return Ok(());
        }
        self.field_patches
            .entry(entry_id.to_string())
            .or_default()
            .merge(patch);
        Ok(())
    }

    pub fn pick_replacement(
        &mut self,
        entry_id: &str,
        new_sheet_id: &str,
    ) -> Result<(), SessionError> {
        self.require_editable(entry_id)?;
        if self.effective_status(entry_id) != Some(InclusionStatus::NewProposal) {
            return Err(SessionError::NotInNewProposal {
                entry_id: entry_id.to_string(),
            });
        }
        let already_active = self
            .effective_sheet_ids()
            .iter()
            .any(|s| s == new_sheet_id);
        if already_active {
            return Err(SessionError::DuplicateSheet {
                sheet_id: new_sheet_id.to_string(),
            });
        }
        self.replacements
            .insert(entry_id.to_string(), new_sheet_id.to_string());
        Ok(())
    }

    pub fn add_sheet(&mut self, addition: EntryAddition) -> Result<(), SessionError> {
        let already_active = self
            .effective_sheet_ids()
            .iter()
            .any(|s| s == &addition.sheet_id);
        if already_active {
            return Err(SessionError::DuplicateSheet {
                sheet_id: addition.sheet_id,
            });
        }
        self.additions.push(addition);
        Ok(())
    }

    pub fn remove_entry(&mut self, entry_id: &str) -> Result<(), SessionError> {
        self.require_editable(entry_id)?;
        // Other buffered edits for the entry are moot once it is removed.
        self.status_changes.remove(entry_id);
        self.replacements.remove(entry_id);
        self.field_patches.remove(entry_id);
        self.removals.push(entry_id.to_string());
        Ok(())
    }

    // ==========================================
    // flush / discard
    // ==========================================

    pub fn has_pending_changes(&self) -> bool {
        !(self.status_changes.is_empty()
            && self.replacements.is_empty()
            && self.field_patches.is_empty()
            && self.additions.is_empty()
            && self.removals.is_empty())
    }

    /// Flush the accumulated edits as one batch, consuming the session.
    /// Returns None when nothing was buffered.
    pub fn into_batch(self) -> Option<MutationBatch> {
        if !self.has_pending_changes() {
            return None;
        }
        Some(MutationBatch {
            status_changes: self.status_changes,
            replacements: self.replacements,
            field_patches: self.field_patches,
            additions: self.additions,
            removals: self.removals,
        })
    }

    /// Discard all buffered state; no repository effect.
    pub fn cancel(self) {}
}
