// ==========================================
// Dossier Technique - Core Library
// ==========================================
// Construction-site management: assembly of versioned, client-facing
// technical document dossiers from a catalog of reusable sheets, with
// per-entry approval / replacement / supersession and regeneration of
// the rendered PDF artifact.
// ==========================================

// ==========================================
// module declarations
// ==========================================

// domain layer - entities and types
pub mod domain;

// repository layer - data access
pub mod repository;

// engine layer - business rules
pub mod engine;

// external collaborators - catalog, renderer, storage, directory
pub mod external;

// configuration
pub mod config;

// database infrastructure (connection init / unified PRAGMAs)
pub mod db;

// logging
pub mod logging;

// API layer - business interfaces
pub mod api;

// ==========================================
// re-export core types
// ==========================================

// domain types
pub use domain::types::{DossierStatus, InclusionStatus, PreferenceField};

// domain entities
pub use domain::{
    CatalogNode, Dossier, DossierEntry, DossierSummary, DossierWithEntries, SheetPreference,
    Subcontractor, TechnicalSheet,
};

// engine
pub use engine::{
    ArtifactGenerator, ArtifactOutcome, CreateDossierRequest, DossierAssemblyEngine,
    DossierEditSession, EntryAddition, EntryFieldPatch, MutationBatch, MutationOutcome,
    SheetSelectionOverride,
};

// API
pub use api::{DossierApi, PreferenceApi};

// ==========================================
// constants
// ==========================================

// crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// application name
pub const APP_NAME: &str = "Dossier Technique";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
