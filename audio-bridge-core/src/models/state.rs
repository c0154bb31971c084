/// Coarse bridge phase, derived from the connection, health and active flags.
///
/// ```text
/// disconnected → connected → active
///                    ↓          ↓
///                 failed  ←─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePhase {
    Disconnected,
    Connected,
    Active,
    Failed,
}

/// Point-in-time snapshot of the bridge state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeStatus {
    pub connected: bool,
    pub healthy: bool,
    pub active: bool,
    /// Configured output channel count.
    pub output_channels: usize,
    /// Output ports currently registered with the host.
    pub registered_outputs: usize,
    /// Frames per period the scratch buffer is sized for.
    pub period_length: u32,
    pub sample_rate: u32,
    /// Scratch buffer length in samples.
    pub scratch_samples: usize,
}

impl BridgeStatus {
    pub fn phase(&self) -> BridgePhase {
        match (self.connected, self.healthy, self.active) {
            (false, _, _) => BridgePhase::Disconnected,
            (true, false, _) => BridgePhase::Failed,
            (true, true, false) => BridgePhase::Connected,
            (true, true, true) => BridgePhase::Active,
        }
    }

    pub fn is_usable(&self) -> bool {
        matches!(self.phase(), BridgePhase::Connected | BridgePhase::Active)
    }
}

/// Result of one Process Engine invocation, as handed back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// The period was serviced (or deliberately skipped).
    Continue,
    /// An output port buffer was unavailable; the host treats the period as failed.
    Failed,
}

impl ProcessStatus {
    /// Numeric form returned to the host: 0 on success, non-zero on failure.
    pub fn code(&self) -> i32 {
        match self {
            Self::Continue => 0,
            Self::Failed => 1,
        }
    }
}
