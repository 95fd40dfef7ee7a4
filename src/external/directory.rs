// ==========================================
// Dossier Technique - Subcontractor Directory Collaborator
// ==========================================
// Read-only listing of active subcontractors, used when assigning a
// subcontractor to an entry or a preference.
// ==========================================

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::Subcontractor;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// External subcontractor directory.
#[async_trait]
pub trait SubcontractorDirectory: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Subcontractor>, DirectoryError>;
}

// ==========================================
// InMemoryDirectory
// ==========================================
pub struct InMemoryDirectory {
    active: Vec<Subcontractor>,
}

impl InMemoryDirectory {
    pub fn new(active: Vec<Subcontractor>) -> Self {
        Self { active }
    }
}

#[async_trait]
impl SubcontractorDirectory for InMemoryDirectory {
    async fn list_active(&self) -> Result<Vec<Subcontractor>, DirectoryError> {
        Ok(self.active.clone())
    }
}
