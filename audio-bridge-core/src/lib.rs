//! # audio-bridge-core
//!
//! Duplex bridge between a JACK-style host audio graph and an application
//! that captures one mono stream and plays a multi-channel mix.
//!
//! The bridge registers one input port and up to [`MAX_OUTPUT_PORTS`] output
//! ports, feeds each period's input to a [`CaptureSink`], asks a
//! [`RenderSource`] for an interleaved mix and de-interleaves it onto the
//! output ports. Host bindings implement [`AudioServer`] and [`HostClient`];
//! the `testing` feature adds `testing::SimulatedServer`, an in-process
//! implementation.
//!
//! ## Architecture
//!
//! ```text
//! audio-bridge-core (this crate)
//! ├── bridge/       ← AudioBridge: lifecycle, topology, process engine, auto-connect
//! ├── traits/       ← AudioServer, HostClient, ProcessScope, HostCallbacks, CaptureSink, RenderSource, SettingsStore
//! ├── models/       ← BridgeError, HostStatus, BridgeSettings, BridgeStatus, port types
//! ├── processing/   ← de-interleaving, port set, scratch buffer
//! ├── storage/      ← JSON and in-memory settings stores
//! └── testing/      ← SimulatedServer and test collaborators (feature `testing`)
//! ```

pub mod bridge;
pub mod models;
pub mod processing;
pub mod storage;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use bridge::{AudioBridge, AutoConnectReport, MAX_AUTO_CONNECT_ENTRIES};
pub use models::config::BridgeSettings;
pub use models::error::{BridgeError, HostError};
pub use models::port::{PortDirection, PortFlags, PortId, PortInfo, MAX_OUTPUT_PORTS};
pub use models::state::{BridgePhase, BridgeStatus, ProcessStatus};
pub use models::status::HostStatus;
pub use storage::settings_file::{JsonSettingsStore, MemorySettingsStore};
pub use traits::audio_host::{AudioServer, HostClient, OpenedClient, ServerStartPolicy};
pub use traits::capture_sink::{CaptureSink, SharedCaptureSink};
pub use traits::host_callbacks::HostCallbacks;
pub use traits::process_scope::ProcessScope;
pub use traits::render_source::{RenderSource, SharedRenderSource};
pub use traits::settings_store::SettingsStore;
