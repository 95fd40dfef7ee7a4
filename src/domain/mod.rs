// ==========================================
// Dossier Technique - Domain Layer
// ==========================================
// Entities and value types only; no persistence, no business rules.
// ==========================================

pub mod catalog;
pub mod dossier;
pub mod preference;
pub mod types;

// re-export core types
pub use catalog::{CatalogNode, Subcontractor, TechnicalSheet};
pub use dossier::{
    derive_dossier_status, Dossier, DossierEntry, DossierSummary, DossierWithEntries,
};
pub use preference::SheetPreference;
pub use types::{DossierStatus, InclusionStatus, PreferenceField};
