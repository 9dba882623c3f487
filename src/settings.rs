use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FinanzasError, Result};

pub const IMAGES_DIR: &str = "graficas";
const LOCAL_SETTINGS: &str = "finanzas.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_input")]
    pub input: String,
    #[serde(default = "default_sheet")]
    pub sheet: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_overview_charts")]
    pub overview_charts: bool,
}

fn default_input() -> String {
    "FinanzasPersonalesIA2025.xlsx".to_string()
}

fn default_sheet() -> String {
    "Movements".to_string()
}

fn default_output_dir() -> String {
    "reporte".to_string()
}

fn default_overview_charts() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: default_input(),
            sheet: default_sheet(),
            output_dir: default_output_dir(),
            overview_charts: default_overview_charts(),
        }
    }
}

impl Settings {
    pub fn input_path(&self) -> PathBuf {
        PathBuf::from(&self.input)
    }

    pub fn report_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.report_dir().join(IMAGES_DIR)
    }
}

fn user_settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("finanzas").join("settings.json"))
}

pub fn read_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| FinanzasError::Settings(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| FinanzasError::Settings(format!("{}: {e}", path.display())))
}

/// An explicit path must exist and parse. Otherwise `./finanzas.json`, then
/// `~/.config/finanzas/settings.json`; a broken implicit file falls back to
/// defaults with a warning.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        return read_settings(path);
    }
    let candidates = std::iter::once(PathBuf::from(LOCAL_SETTINGS)).chain(user_settings_path());
    for path in candidates {
        if !path.exists() {
            continue;
        }
        match read_settings(&path) {
            Ok(settings) => {
                tracing::debug!(path = %path.display(), "settings loaded");
                return Ok(settings);
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable settings file");
                return Ok(Settings::default());
            }
        }
    }
    Ok(Settings::default())
}
