// ==========================================
// Dossier Technique - Mutation Batch
// ==========================================
// One immutable value object carrying every buffered edit kind against an
// existing dossier. Built either directly by a caller or accumulated in a
// DossierEditSession and submitted as a single logical transaction.
//
// A batch is NOT retryable at will: re-submitting the same batch cannot
// double-apply replacements (the NEW_PROPOSAL state check blocks the
// second run) but would re-append its additions.
// ==========================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::dossier::DossierEntry;
use crate::domain::types::InclusionStatus;

// ==========================================
// EntryFieldPatch - partial field override
// ==========================================
// None means "leave unchanged"; there is no way to clear a field through
// a patch (matching the screens, which only ever write values).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryFieldPatch {
    pub subcontractor_id: Option<String>,
    pub reference_code: Option<String>,
    pub remarks: Option<String>,
}

impl EntryFieldPatch {
    pub fn is_empty(&self) -> bool {
        self.subcontractor_id.is_none() && self.reference_code.is_none() && self.remarks.is_none()
    }

    pub fn apply(&self, entry: &mut DossierEntry) {
        if let Some(v) = &self.subcontractor_id {
            entry.subcontractor_id = Some(v.clone());
        }
        if let Some(v) = &self.reference_code {
            entry.reference_code = Some(v.clone());
        }
        if let Some(v) = &self.remarks {
            entry.remarks = Some(v.clone());
        }
    }

    /// Merge a later patch over this one (later fields win).
    pub fn merge(&mut self, later: EntryFieldPatch) {
        if later.subcontractor_id.is_some() {
            self.subcontractor_id = later.subcontractor_id;
        }
        if later.reference_code.is_some() {
            self.reference_code = later.reference_code;
        }
        if later.remarks.is_some() {
            self.remarks = later.remarks;
        }
    }
}

// ==========================================
// EntryAddition - one sheet to append
// ==========================================
// Fields left at None are seeded from the Preference Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryAddition {
    pub sheet_id: String,
    pub reference_code: Option<String>,
    pub inclusion_status: Option<InclusionStatus>,
    pub subcontractor_id: Option<String>,
    pub remarks: Option<String>,
}

impl EntryAddition {
    pub fn new(sheet_id: &str) -> Self {
        Self {
            sheet_id: sheet_id.to_string(),
            reference_code: None,
            inclusion_status: None,
            subcontractor_id: None,
            remarks: None,
        }
    }
}

// ==========================================
// MutationBatch
// ==========================================
// The engine applies the parts in a fixed order: removals, then status
// changes and field patches, then replacements, then additions, then the
// order re-pack. Any validation failure rejects the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationBatch {
    /// entry_id -> new inclusion status
    pub status_changes: HashMap<String, InclusionStatus>,
    /// entry_id -> replacement sheet_id; the target must be in
    /// NEW_PROPOSAL once status_changes have been applied
    pub replacements: HashMap<String, String>,
    /// entry_id -> partial field override
    pub field_patches: HashMap<String, EntryFieldPatch>,
    /// appended at the end of the order sequence
    pub additions: Vec<EntryAddition>,
    /// entry ids to delete; applied first, freeing their sheet ids for
    /// reuse within the same batch
    pub removals: Vec<String>,
}

impl MutationBatch {
    pub fn is_empty(&self) -> bool {
        self.status_changes.is_empty()
            && self.replacements.is_empty()
            && self.field_patches.is_empty()
            && self.additions.is_empty()
            && self.removals.is_empty()
    }
}
