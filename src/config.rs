// ==========================================
// Dossier Technique - Application Configuration
// ==========================================
// Small JSON config file under the platform config dir; every field has
// a default so a missing or partial file is never fatal.
// ==========================================

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Directory name under the platform config dir.
const CONFIG_DIR_NAME: &str = "chantier-dossier";
const CONFIG_FILE_NAME: &str = "config.json";

/// Default timeout for one artifact render call (seconds).
/// The renderer is an external collaborator and may take seconds per
/// dossier; this is the only operation in the engine that carries a
/// timeout.
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file path.
    pub db_path: String,
    /// Directory where generated artifacts are stored (LocalFileStorage).
    pub artifact_dir: String,
    /// Timeout applied around each render call.
    pub render_timeout_secs: u64,
    /// Default for the table-of-contents option when a creation request
    /// does not specify it.
    pub include_toc_default: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME);
        Self {
            db_path: data_dir.join("dossier.db").to_string_lossy().into_owned(),
            artifact_dir: data_dir.join("artifacts").to_string_lossy().into_owned(),
            render_timeout_secs: DEFAULT_RENDER_TIMEOUT_SECS,
            include_toc_default: true,
        }
    }
}

impl AppConfig {
    /// Path of the config file, when a platform config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults.
    ///
    /// A malformed file is logged and ignored rather than failing startup.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => match fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str::<AppConfig>(&raw) {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "malformed config file, using defaults");
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable config file, using defaults");
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    pub fn render_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.render_timeout_secs)
    }
}
