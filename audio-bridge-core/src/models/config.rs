use serde::{Deserialize, Serialize};

/// Longest client name the host accepts.
pub const CLIENT_NAME_MAX: usize = 64;

/// Persisted bridge settings.
///
/// Every field falls back to its default when missing from the stored form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Name the client registers under in the host graph.
    pub client_name: String,

    /// Desired output channel count, stored as text. Empty or unparsable
    /// text means mono.
    pub output_channels: String,

    /// Wire ports to physical hardware after activation (default: true).
    pub auto_connect: bool,

    /// Start the host server if none is running (default: false).
    pub start_server: bool,

    /// How long `AudioBridge::start` waits for the bridge to become healthy.
    pub startup_timeout_ms: u64,
}

impl BridgeSettings {
    /// Channel count requested by the stored text, before clamping.
    pub fn desired_output_channels(&self) -> usize {
        self.output_channels.trim().parse::<usize>().unwrap_or(1)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.client_name.is_empty() {
            return Err("client name must not be empty".into());
        }
        if self.client_name.len() > CLIENT_NAME_MAX {
            return Err(format!(
                "client name longer than {} bytes: {}",
                CLIENT_NAME_MAX, self.client_name
            ));
        }
        if self.startup_timeout_ms == 0 {
            return Err("startup timeout must be positive".into());
        }
        Ok(())
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            client_name: "audio-bridge".into(),
            output_channels: String::new(),
            auto_connect: true,
            start_server: false,
            startup_timeout_ms: 1000,
        }
    }
}
