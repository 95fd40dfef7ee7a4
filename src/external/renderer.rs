// ==========================================
// Dossier Technique - Artifact Rendering Collaborator
// ==========================================
// The binary PDF engine lives outside this crate. The contract here is a
// pure function of its inputs: the same cover metadata, ordered sheet
// inputs and options must yield a semantically equivalent document.
// ==========================================

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("renderer failed: {0}")]
    Failed(String),

    #[error("renderer unavailable: {0}")]
    Unavailable(String),
}

// ==========================================
// Render inputs
// ==========================================

/// Cover page metadata for one dossier artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverMetadata {
    pub dossier_name: String,
    pub project_id: String,
    pub dossier_version: i32,
    pub entry_count: usize,
    pub generated_at: NaiveDateTime,
}

/// One sheet of the assembled document, fully resolved: catalog content
/// plus the entry-level overrides that must appear in the rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetRenderInput {
    pub sheet_id: String,
    pub title: String,
    pub category_path: Vec<String>,
    pub reference_code: Option<String>,
    pub sheet_version: i32,
    pub subcontractor_id: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderOptions {
    pub include_toc: bool,
}

/// External PDF renderer.
#[async_trait]
pub trait ArtifactRenderer: Send + Sync {
    /// Render one dossier. May take seconds; the caller owns the timeout.
    async fn render(
        &self,
        cover: &CoverMetadata,
        sheets: &[SheetRenderInput],
        options: RenderOptions,
    ) -> Result<Vec<u8>, RenderError>;
}
