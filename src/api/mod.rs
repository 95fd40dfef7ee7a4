// ==========================================
// Dossier Technique - API Layer
// ==========================================
// Transport-agnostic business interfaces for the application shell.
// ==========================================

pub mod dossier_api;
pub mod error;
pub mod preference_api;

// re-export core types
pub use dossier_api::{
    DossierApi, DossierDetail, DossierEntryInfo, DossierInfo, DossierSaveResponse,
    DossierSummaryInfo,
};
pub use error::{ApiError, ApiResult};
pub use preference_api::{PreferenceApi, PreferenceInfo, SubcontractorInfo};
