// ==========================================
// Dossier Technique - Domain Type Definitions
// ==========================================
// Serialization format: SCREAMING_SNAKE_CASE (aligned with the database)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// Dossier Status
// ==========================================
// Lifecycle of the client-facing package as a whole.
// SENT is set explicitly; the other three are derived from entry statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DossierStatus {
    Draft,             // being assembled / edited
    Sent,              // handed over to the client, no feedback yet
    PartiallyRejected, // at least one sheet flagged for replacement
    Approved,          // every sheet approved by the client
}

impl fmt::Display for DossierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DossierStatus::Draft => write!(f, "DRAFT"),
            DossierStatus::Sent => write!(f, "SENT"),
            DossierStatus::PartiallyRejected => write!(f, "PARTIALLY_REJECTED"),
            DossierStatus::Approved => write!(f, "APPROVED"),
        }
    }
}

impl FromStr for DossierStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(DossierStatus::Draft),
            "SENT" => Ok(DossierStatus::Sent),
            "PARTIALLY_REJECTED" => Ok(DossierStatus::PartiallyRejected),
            "APPROVED" => Ok(DossierStatus::Approved),
            other => Err(format!("unknown dossier status: {}", other)),
        }
    }
}

// ==========================================
// Inclusion Status
// ==========================================
// Per-entry state inside one dossier.
// NEW_PROPOSAL is the only state from which a replacement may be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InclusionStatus {
    Draft,        // included, not yet reviewed
    Approved,     // validated by the client
    ToBeReplaced, // rejected, waiting for a replacement pick
    NewProposal,  // replacement pick pending commit
}

impl fmt::Display for InclusionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InclusionStatus::Draft => write!(f, "DRAFT"),
            InclusionStatus::Approved => write!(f, "APPROVED"),
            InclusionStatus::ToBeReplaced => write!(f, "TO_BE_REPLACED"),
            InclusionStatus::NewProposal => write!(f, "NEW_PROPOSAL"),
        }
    }
}

impl FromStr for InclusionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(InclusionStatus::Draft),
            "APPROVED" => Ok(InclusionStatus::Approved),
            "TO_BE_REPLACED" => Ok(InclusionStatus::ToBeReplaced),
            "NEW_PROPOSAL" => Ok(InclusionStatus::NewProposal),
            other => Err(format!("unknown inclusion status: {}", other)),
        }
    }
}

// ==========================================
// Preference Field
// ==========================================
// Addressable fields of a (project, sheet) preference row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferenceField {
    SubcontractorId,
    ReferenceCode,
    Remarks,
}

impl fmt::Display for PreferenceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceField::SubcontractorId => write!(f, "SUBCONTRACTOR_ID"),
            PreferenceField::ReferenceCode => write!(f, "REFERENCE_CODE"),
            PreferenceField::Remarks => write!(f, "REMARKS"),
        }
    }
}
