use std::time::Duration;

use thiserror::Error;

use super::status::HostStatus;

/// Numeric failure code returned by a host API call.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("host returned {code}")]
pub struct HostError {
    pub code: i32,
}

impl HostError {
    pub fn new(code: i32) -> Self {
        Self { code }
    }
}

/// Errors surfaced by control-plane bridge operations.
///
/// The real-time path never produces these; it reports through
/// [`ProcessStatus`](crate::ProcessStatus) instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("unable to open host client: {0}")]
    ConnectionFailed(HostStatus),

    #[error("unable to register port '{port}' (code {code})")]
    PortRegistration { port: String, code: i32 },

    #[error("unable to set {callback} callback (code {code})")]
    CallbackRegistration { callback: &'static str, code: i32 },

    #[error("unable to activate client (code {0})")]
    Activation(i32),

    #[error("unable to allocate scratch buffer of {samples} samples")]
    Allocation { samples: usize },

    #[error("not connected to a host audio server")]
    NotConnected,

    #[error("bridge is not healthy")]
    Unhealthy,

    #[error("host did not become ready within {0:?}")]
    StartupTimeout(Duration),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}
