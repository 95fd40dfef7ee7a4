// ==========================================
// Dossier Technique - API Layer Error Types
// ==========================================
// User-facing error surface; converts engine and repository errors into
// explicit, explainable variants. Retries (e.g. of a failed artifact
// regeneration) belong to the caller, never to this layer.
// ==========================================

use thiserror::Error;

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;

/// API-layer error type.
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== business rule errors =====
    #[error("unknown sheet: {0}")]
    UnknownSheet(String),

    #[error("duplicate sheet: {0}")]
    DuplicateSheet(String),

    #[error("invalid replacement state: {0}")]
    InvalidReplacementState(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    // ===== generation errors =====
    #[error("artifact generation failed: {0}")]
    GenerationFailed(String),

    // ===== data access errors =====
    #[error("database error: {0}")]
    DatabaseError(String),

    // ===== external collaborators =====
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    // ===== generic =====
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::EmptySelection => {
                ApiError::InvalidInput("a dossier needs at least one sheet".to_string())
            }
            EngineError::UnknownSheet { sheet_id } => ApiError::UnknownSheet(sheet_id),
            EngineError::DuplicateSheet { sheet_id } => ApiError::DuplicateSheet(sheet_id),
            EngineError::UnknownEntry { entry_id } => {
                ApiError::NotFound(format!("entry {} in this dossier", entry_id))
            }
            EngineError::InvalidReplacementState { entry_id, status } => {
                ApiError::InvalidReplacementState(format!(
                    "entry {} is in {}, replacement requires NEW_PROPOSAL",
                    entry_id, status
                ))
            }
            EngineError::DossierNotFound { dossier_id } => {
                ApiError::NotFound(format!("dossier {}", dossier_id))
            }
            EngineError::CatalogUnavailable(msg) => ApiError::CollaboratorUnavailable(msg),
            EngineError::GenerationFailed(e) => ApiError::GenerationFailed(e.to_string()),
            EngineError::Repository(e) => e.into(),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::ValidationError(msg) => ApiError::InternalError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result type alias.
pub type ApiResult<T> = Result<T, ApiError>;
