// ==========================================
// Dossier Technique - Sheet Preference Model
// ==========================================
// Durable, non-versioned per-(project, sheet) defaults. Created lazily on
// first edit, updated in place afterwards, never deleted automatically.
// Independent of any dossier: preferences survive dossier deletion and
// pre-populate future selections.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetPreference {
    pub project_id: String,
    pub sheet_id: String,
    pub subcontractor_id: Option<String>,
    pub reference_code: Option<String>,
    pub remarks: Option<String>,
    pub updated_at: NaiveDateTime,
}
