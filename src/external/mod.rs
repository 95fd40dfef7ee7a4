// ==========================================
// Dossier Technique - External Collaborators
// ==========================================
// Interfaces consumed from the outside world (catalog, renderer, file
// storage, subcontractor directory) plus the local/in-memory
// implementations used for embedding and tests. The engine never talks
// to a concrete service directly; everything is injected through these
// traits.
// ==========================================

pub mod catalog;
pub mod directory;
pub mod renderer;
pub mod storage;

// re-export core types
pub use catalog::{CatalogError, CatalogIndex, InMemoryCatalog};
pub use directory::{DirectoryError, InMemoryDirectory, SubcontractorDirectory};
pub use renderer::{ArtifactRenderer, CoverMetadata, RenderError, RenderOptions, SheetRenderInput};
pub use storage::{FileStorage, LocalFileStorage, StorageError};
