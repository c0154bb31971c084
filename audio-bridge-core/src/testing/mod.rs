//! Test doubles for driving the bridge without a real audio server.

pub mod collaborators;
pub mod simulated_host;

pub use collaborators::{IndexRampSource, RecordingCapture};
pub use simulated_host::{CallbackKind, CycleReport, SimulatedDriver, SimulatedServer};
