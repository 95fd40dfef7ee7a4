// ==========================================
// Dossier Technique - Artifact Generator
// ==========================================
// Thin wrapper over the external rendering collaborator: resolves the
// ordered entry list against the catalog, builds the cover metadata and
// hands everything to the renderer, then stores the binary.
//
// Pure with respect to dossier state: generating never mutates entries,
// so it can run standalone at any time to rebuild a lost binary from the
// current entry list. The render call is the only operation in the
// engine that carries a timeout.
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::domain::dossier::{Dossier, DossierEntry};
use crate::engine::error::GenerationError;
use crate::external::catalog::CatalogIndex;
use crate::external::renderer::{
    ArtifactRenderer, CoverMetadata, RenderOptions, SheetRenderInput,
};
use crate::external::storage::FileStorage;

/// Result of one successful generation.
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    pub url: String,
    pub generated_at: NaiveDateTime,
}

pub struct ArtifactGenerator {
    catalog: Arc<dyn CatalogIndex>,
    renderer: Arc<dyn ArtifactRenderer>,
    storage: Arc<dyn FileStorage>,
    render_timeout: Duration,
}

impl ArtifactGenerator {
    pub fn new(
        catalog: Arc<dyn CatalogIndex>,
        renderer: Arc<dyn ArtifactRenderer>,
        storage: Arc<dyn FileStorage>,
        render_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            renderer,
            storage,
            render_timeout,
        }
    }

    /// Render and store the artifact for one dossier state.
    ///
    /// `entries` must already be in rendering order. Same inputs produce
    /// a semantically equivalent document (same sheets, same order, same
    /// cover metadata).
    pub async fn generate(
        &self,
        dossier: &Dossier,
        entries: &[DossierEntry],
    ) -> Result<GeneratedArtifact, GenerationError> {
        let sheets = self.resolve_entries(entries).await?;
        let generated_at = chrono::Utc::now().naive_utc();
        let cover = CoverMetadata {
            dossier_name: dossier.name.clone(),
            project_id: dossier.project_id.clone(),
            dossier_version: dossier.version,
            entry_count: sheets.len(),
            generated_at,
        };
        let options = RenderOptions {
            include_toc: dossier.include_toc,
        };

        debug!(
            dossier_id = %dossier.dossier_id,
            sheets = sheets.len(),
            include_toc = dossier.include_toc,
            "rendering dossier artifact"
        );

        let render = self.renderer.render(&cover, &sheets, options);
        let bytes = match tokio::time::timeout(self.render_timeout, render).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return Err(GenerationError::Render(e.to_string())),
            Err(_) => {
                return Err(GenerationError::Timeout {
                    secs: self.render_timeout.as_secs(),
                })
            }
        };

        let file_name = Self::artifact_file_name(dossier);
        let url = self
            .storage
            .store(&file_name, &bytes)
            .await
            .map_err(|e| GenerationError::Storage(e.to_string()))?;

        info!(
            dossier_id = %dossier.dossier_id,
            version = dossier.version,
            url = %url,
            "dossier artifact generated"
        );
        Ok(GeneratedArtifact { url, generated_at })
    }

    /// Resolve entries against the catalog into renderer inputs.
    ///
    /// A sheet the catalog no longer knows renders with a placeholder
    /// title: the catalog is a soft reference and regeneration must stay
    /// possible even after a sheet is retired from it.
    async fn resolve_entries(
        &self,
        entries: &[DossierEntry],
    ) -> Result<Vec<SheetRenderInput>, GenerationError> {
        let mut sheets = Vec::with_capacity(entries.len());
        for entry in entries {
            let resolved = self
                .catalog
                .get_sheet(&entry.sheet_id)
                .await
                .map_err(|e| GenerationError::Catalog(e.to_string()))?;
            let (title, category_path, default_reference) = match resolved {
                Some(sheet) => (sheet.title, sheet.category_path, sheet.default_reference_code),
                None => (
                    format!("Fiche {} (retirée du catalogue)", entry.sheet_id),
                    Vec::new(),
                    None,
                ),
            };
            sheets.push(SheetRenderInput {
                sheet_id: entry.sheet_id.clone(),
                title,
                category_path,
                reference_code: entry.reference_code.clone().or(default_reference),
                sheet_version: entry.sheet_version,
                subcontractor_id: entry.subcontractor_id.clone(),
                remarks: entry.remarks.clone(),
            });
        }
        Ok(sheets)
    }

    /// File name carries the dossier version so successive generations
    /// never overwrite each other in storage.
    fn artifact_file_name(dossier: &Dossier) -> String {
        format!("dossier-{}-v{}.pdf", dossier.dossier_id, dossier.version)
    }
}
