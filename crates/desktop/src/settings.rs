use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use moodlens_core::shared::constants::{
    DEFAULT_CAMERA_INDEX, DEFAULT_LOOP_DELAY, DEFAULT_MODEL_BASE,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory or URL prefix the model files are resolved from.
    pub model_base: String,
    pub camera_index: u32,
    pub loop_delay_ms: u64,
    /// Face detection confidence threshold, in percent.
    pub confidence: u32,
    pub font_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_base: DEFAULT_MODEL_BASE.to_string(),
            camera_index: DEFAULT_CAMERA_INDEX,
            loop_delay_ms: DEFAULT_LOOP_DELAY.as_millis() as u64,
            confidence: 50,
            font_path: None,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("MoodLens").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .map(|json| Self::from_json(&json))
            .unwrap_or_default()
    }

    /// Parses settings, falling back to defaults for anything invalid.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring invalid settings file: {e}");
                Self::default()
            }
        }
    }

    /// Writes the current settings so a first run leaves an editable file.
    /// Failures are logged; the app keeps running on in-memory settings.
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            log::warn!("No config directory; settings will not be saved");
            return;
        };
        if let Err(e) = self.write_to(&path) {
            log::warn!("Failed to save settings to {}: {e}", path.display());
        }
    }

    fn write_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence.min(100) as f64 / 100.0
    }
}
