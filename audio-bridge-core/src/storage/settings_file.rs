use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::models::config::BridgeSettings;
use crate::models::error::BridgeError;
use crate::traits::settings_store::SettingsStore;

/// Settings persisted as a pretty-printed JSON file.
///
/// A missing file reads as the defaults.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<BridgeSettings, BridgeError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BridgeSettings::default()),
            Err(e) => {
                return Err(BridgeError::Settings(format!("failed to read settings: {}", e)));
            }
        };
        serde_json::from_str(&json)
            .map_err(|e| BridgeError::Settings(format!("failed to parse settings: {}", e)))
    }

    fn save(&self, settings: &BridgeSettings) -> Result<(), BridgeError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BridgeError::Settings(format!("failed to create directory: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| BridgeError::Settings(format!("failed to serialize settings: {}", e)))?;
        fs::write(&self.path, json)
            .map_err(|e| BridgeError::Settings(format!("failed to write settings: {}", e)))?;
        Ok(())
    }
}

/// Settings held in memory only.
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<BridgeSettings>,
}

impl MemorySettingsStore {
    pub fn new(settings: BridgeSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }

    /// Current stored value.
    pub fn snapshot(&self) -> BridgeSettings {
        self.settings.lock().clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<BridgeSettings, BridgeError> {
        Ok(self.snapshot())
    }

    fn save(&self, settings: &BridgeSettings) -> Result<(), BridgeError> {
        *self.settings.lock() = settings.clone();
        Ok(())
    }
}
