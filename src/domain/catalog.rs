// ==========================================
// Dossier Technique - Catalog Domain Model
// ==========================================
// Entities owned by the external collaborators (Catalog Index,
// Subcontractor Directory). Read-only from this engine's perspective.
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// TechnicalSheet - catalog entity
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalSheet {
    pub sheet_id: String,
    pub title: String,
    /// Hierarchical category, root first (e.g. ["Gros œuvre", "Béton"]).
    pub category_path: Vec<String>,
    pub default_reference_code: Option<String>,
}

// ==========================================
// CatalogNode - hierarchical listing
// ==========================================
// One category level of the catalog tree, as returned by list_sheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogNode {
    pub category: String,
    pub sheets: Vec<TechnicalSheet>,
    pub children: Vec<CatalogNode>,
}

impl CatalogNode {
    pub fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            sheets: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Total number of sheets in this node and all descendants.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len() + self.children.iter().map(|c| c.sheet_count()).sum::<usize>()
    }
}

// ==========================================
// Subcontractor - directory entity
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcontractor {
    pub subcontractor_id: String,
    pub name: String,
}
