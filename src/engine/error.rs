// ==========================================
// Dossier Technique - Engine Error Types
// ==========================================
// Typed results for every engine-level failure; no silent defaults.
// Retry policy lives with the caller (e.g. retry regenerate_artifact
// after a GenerationFailed), never inside the engine.
// ==========================================

use thiserror::Error;

use crate::domain::types::InclusionStatus;
use crate::repository::error::RepositoryError;

/// Artifact generation failure causes.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("renderer failed: {0}")]
    Render(String),

    #[error("render timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("artifact storage failed: {0}")]
    Storage(String),

    #[error("catalog lookup failed: {0}")]
    Catalog(String),
}

/// Engine-layer error type.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("a dossier needs at least one sheet")]
    EmptySelection,

    #[error("unknown sheet: {sheet_id}")]
    UnknownSheet { sheet_id: String },

    #[error("sheet already active in dossier: {sheet_id}")]
    DuplicateSheet { sheet_id: String },

    #[error("unknown or removed entry: {entry_id}")]
    UnknownEntry { entry_id: String },

    #[error("entry {entry_id} is in {status}, replacement requires NEW_PROPOSAL")]
    InvalidReplacementState {
        entry_id: String,
        status: InclusionStatus,
    },

    #[error("dossier not found: {dossier_id}")]
    DossierNotFound { dossier_id: String },

    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("artifact generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result type alias.
pub type EngineResult<T> = Result<T, EngineError>;
