// ==========================================
// Dossier Technique - Catalog Index Collaborator
// ==========================================
// Read-only hierarchical listing of available technical sheets. The
// catalog is owned by a separate service; this engine only holds soft
// references (sheet ids) into it and must tolerate sheets disappearing.
// ==========================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::{CatalogNode, TechnicalSheet};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// External catalog listing service.
#[async_trait]
pub trait CatalogIndex: Send + Sync {
    /// Hierarchical listing, optionally filtered by a title substring.
    async fn list_sheets(&self, filter: Option<&str>) -> Result<Vec<CatalogNode>, CatalogError>;

    /// Single sheet lookup; Ok(None) when the id is unknown.
    async fn get_sheet(&self, sheet_id: &str) -> Result<Option<TechnicalSheet>, CatalogError>;
}

// ==========================================
// InMemoryCatalog
// ==========================================
// Catalog backed by a fixed sheet list. Used for tests and for embedding
// the engine without a live catalog service.
pub struct InMemoryCatalog {
    sheets: Vec<TechnicalSheet>,
}

impl InMemoryCatalog {
    pub fn new(sheets: Vec<TechnicalSheet>) -> Self {
        Self { sheets }
    }

    fn build_tree(sheets: &[TechnicalSheet]) -> Vec<CatalogNode> {
        // Group recursively on the first category segment; sheets with an
        // exhausted path attach to the current level.
        fn build_level(sheets: Vec<(&TechnicalSheet, &[String])>) -> Vec<CatalogNode> {
            let mut groups: BTreeMap<String, Vec<(&TechnicalSheet, &[String])>> = BTreeMap::new();
            let mut nodes: Vec<CatalogNode> = Vec::new();
            for (sheet, path) in sheets {
                match path.split_first() {
                    Some((head, rest)) => {
                        groups.entry(head.clone()).or_default().push((sheet, rest));
                    }
                    None => {
                        // Uncategorized sheets land in a leaf node of their own.
                        if nodes.is_empty() || nodes[0].category != "(uncategorized)" {
                            nodes.insert(0, CatalogNode::new("(uncategorized)"));
                        }
                        nodes[0].sheets.push(sheet.clone());
                    }
                }
            }
            for (category, members) in groups {
                let mut node = CatalogNode::new(&category);
                let (leaves, deeper): (Vec<_>, Vec<_>) =
                    members.into_iter().partition(|(_, rest)| rest.is_empty());
                node.sheets = leaves.into_iter().map(|(s, _)| s.clone()).collect();
                node.children = build_level(deeper);
                nodes.push(node);
            }
            nodes
        }

        build_level(
            sheets
                .iter()
                .map(|s| (s, s.category_path.as_slice()))
                .collect(),
        )
    }
}

#[async_trait]
impl CatalogIndex for InMemoryCatalog {
    async fn list_sheets(&self, filter: Option<&str>) -> Result<Vec<CatalogNode>, CatalogError> {
        let filtered: Vec<TechnicalSheet> = match filter {
            Some(needle) => {
                let needle = needle.to_lowercase();
                self.sheets
                    .iter()
                    .filter(|s| s.title.to_lowercase().contains(&needle))
                    .cloned()
                    .collect()
            }
            None => self.sheets.clone(),
        };
        Ok(Self::build_tree(&filtered))
    }

    async fn get_sheet(&self, sheet_id: &str) -> Result<Option<TechnicalSheet>, CatalogError> {
        Ok(self.sheets.iter().find(|s| s.sheet_id == sheet_id).cloned())
    }
}
