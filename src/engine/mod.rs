// ==========================================
// Dossier Technique - Engine Layer
// ==========================================
// Business rules: dossier assembly, batched mutation, artifact
// generation, client-side edit buffering. The engine owns the state
// transitions; repositories only move rows.
// ==========================================

pub mod artifact;
pub mod assembly;
pub mod batch;
pub mod error;
pub mod session;

// re-export core types
pub use artifact::{ArtifactGenerator, GeneratedArtifact};
pub use assembly::{
    ArtifactOutcome, CreateDossierRequest, DossierAssemblyEngine, MutationOutcome,
    SheetSelectionOverride,
};
pub use batch::{EntryAddition, EntryFieldPatch, MutationBatch};
pub use error::{EngineError, EngineResult, GenerationError};
pub use session::{DossierEditSession, SessionError};
