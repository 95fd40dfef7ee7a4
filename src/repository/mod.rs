// ==========================================
// Dossier Technique - Repository Layer
// ==========================================
// Data access only; business rules live in the engine layer.
// ==========================================

pub mod dossier_repo;
pub mod error;
pub mod preference_repo;

// re-export core types
pub use dossier_repo::DossierRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use preference_repo::PreferenceRepository;
