// ==========================================
// Dossier Technique - Dossier Domain Model
// ==========================================
// A dossier is the unit of artifact generation: one named, versioned
// package of technical sheets assembled for one project, rendered as a
// single PDF. Entries are the inclusion records binding catalog sheets
// to the dossier; they carry status, ordering and per-entry overrides.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{DossierStatus, InclusionStatus};

// ==========================================
// Dossier - package metadata
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dossier {
    pub dossier_id: String,
    pub project_id: String,
    pub name: String,
    /// Starts at 1, incremented by exactly 1 on every committed mutation
    /// batch. Used in generated artifact file names.
    pub version: i32,
    pub status: DossierStatus,
    /// Creation-time option, reused on every regeneration.
    pub include_toc: bool,
    /// May point at a binary that storage has since evicted; the current
    /// entry list is always sufficient to regenerate it.
    pub artifact_url: Option<String>,
    pub generated_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub modified_at: NaiveDateTime,
}

// ==========================================
// DossierEntry - one included sheet
// ==========================================
// `sheet_id` and `replaces_sheet_id` are soft references into the
// externally-owned catalog; no foreign key is enforced on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierEntry {
    pub entry_id: String,
    pub dossier_id: String,
    pub sheet_id: String,
    /// Override of the catalog sheet's default reference code.
    pub reference_code: Option<String>,
    /// 1 for a freshly added entry; +1 each time the logical slot is
    /// replaced by a newer sheet.
    pub sheet_version: i32,
    pub inclusion_status: InclusionStatus,
    /// Position in the assembled document; dense, gap-free per dossier.
    pub order_no: i32,
    /// Set only on entries created by a replacement: the sheet_id this
    /// entry superseded. The superseded entry is retired in the same
    /// batch, so the referenced sheet is never active alongside this one.
    pub replaces_sheet_id: Option<String>,
    pub subcontractor_id: Option<String>,
    pub remarks: Option<String>,
}

impl DossierEntry {
    /// True when this entry may be targeted by a replacement commit.
    pub fn is_replaceable(&self) -> bool {
        self.inclusion_status == InclusionStatus::NewProposal
    }

    /// True when this entry resulted from a replacement.
    pub fn is_supersession(&self) -> bool {
        self.replaces_sheet_id.is_some()
    }
}

// ==========================================
// DossierWithEntries - load/save unit
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierWithEntries {
    pub dossier: Dossier,
    /// Ordered by `order_no` ascending.
    pub entries: Vec<DossierEntry>,
}

impl DossierWithEntries {
    pub fn entry_by_id(&self, entry_id: &str) -> Option<&DossierEntry> {
        self.entries.iter().find(|e| e.entry_id == entry_id)
    }

    pub fn contains_sheet(&self, sheet_id: &str) -> bool {
        self.entries.iter().any(|e| e.sheet_id == sheet_id)
    }
}

// ==========================================
// DossierSummary - listing row
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierSummary {
    pub dossier_id: String,
    pub project_id: String,
    pub name: String,
    pub version: i32,
    pub status: DossierStatus,
    pub artifact_url: Option<String>,
    pub generated_at: Option<NaiveDateTime>,
    pub modified_at: NaiveDateTime,
    pub entry_count: i64,
}

/// Derive the dossier status from its active entries.
///
/// Rules (applied after every committed mutation batch):
/// - any entry in TO_BE_REPLACED or NEW_PROPOSAL → PARTIALLY_REJECTED
/// - every entry APPROVED → APPROVED
/// - otherwise → DRAFT (an explicit mark-sent sets SENT; the next
///   mutation re-derives from entry statuses)
pub fn derive_dossier_status(entries: &[DossierEntry]) -> DossierStatus {
    let any_rejected = entries.iter().any(|e| {
        matches!(
            e.inclusion_status,
            InclusionStatus::ToBeReplaced | InclusionStatus::NewProposal
        )
    });
    if any_rejected {
        return DossierStatus::PartiallyRejected;
    }
    let all_approved = !entries.is_empty()
        && entries
            .iter()
            .all(|e| e.inclusion_status == InclusionStatus::Approved);
    if all_approved {
        DossierStatus::Approved
    } else {
        DossierStatus::Draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(status: InclusionStatus) -> DossierEntry {
        DossierEntry {
            entry_id: "E".to_string(),
            dossier_id: "D".to_string(),
            sheet_id: "S".to_string(),
            reference_code: None,
            sheet_version: 1,
            inclusion_status: status,
            order_no: 0,
            replaces_sheet_id: None,
            subcontractor_id: None,
            remarks: None,
        }
    }

    #[test]
    fn test_derive_status_rejection_wins() {
        let entries = vec![
            entry(InclusionStatus::Approved),
            entry(InclusionStatus::ToBeReplaced),
        ];
        assert_eq!(
            derive_dossier_status(&entries),
            DossierStatus::PartiallyRejected
        );
    }

    #[test]
    fn test_derive_status_all_approved() {
        let entries = vec![
            entry(InclusionStatus::Approved),
            entry(InclusionStatus::Approved),
        ];
        assert_eq!(derive_dossier_status(&entries), DossierStatus::Approved);
    }

    #[test]
    fn test_derive_status_default_draft() {
        let entries = vec![
            entry(InclusionStatus::Approved),
            entry(InclusionStatus::Draft),
        ];
        assert_eq!(derive_dossier_status(&entries), DossierStatus::Draft);
        assert_eq!(derive_dossier_status(&[]), DossierStatus::Draft);
    }
}
