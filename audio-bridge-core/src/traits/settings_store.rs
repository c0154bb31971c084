use crate::models::config::BridgeSettings;
use crate::models::error::BridgeError;

/// Persisted configuration backing the bridge.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<BridgeSettings, BridgeError>;

    fn save(&self, settings: &BridgeSettings) -> Result<(), BridgeError>;
}
