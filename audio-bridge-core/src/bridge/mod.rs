//! The bridge between the host audio graph and the application.
//!
//! ```text
//! control thread                         host real-time thread
//! ──────────────                         ─────────────────────
//! AudioBridge::open / close / activate   BridgeCallbacks::on_process
//! AudioBridge::set_output_channel_count      │ try_lock(period)
//!     │ lock(control)                        ├→ capture sink  (input port)
//!     ├→ lock(period) ─ ports, scratch ←─────┤
//!     └→ lock(render) during resize          └→ render source → de-interleave → output ports
//! ```

mod auto_connect;
mod engine;
mod lifecycle;
mod startup;
mod topology;

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::BridgeSettings;
use crate::models::error::BridgeError;
use crate::models::state::BridgeStatus;
use crate::processing::port_set::PortSet;
use crate::processing::scratch_buffer::ScratchBuffer;
use crate::traits::audio_host::{AudioServer, HostClient};
use crate::traits::capture_sink::SharedCaptureSink;
use crate::traits::render_source::SharedRenderSource;
use crate::traits::settings_store::SettingsStore;

pub use auto_connect::{AutoConnectReport, MAX_AUTO_CONNECT_ENTRIES};
pub use startup::StartupSignal;

/// State guarded by the state-mutation lock. Only the control plane touches it.
struct ControlState {
    client: Option<Box<dyn HostClient>>,
    active: bool,
    channel_count: usize,
    /// Frames per period the scratch buffer is currently sized for.
    period_length: u32,
    settings: BridgeSettings,
}

/// State the Process Engine reads each period.
///
/// The control plane locks it only while holding the state-mutation lock;
/// the engine only ever `try_lock`s it.
#[derive(Default)]
struct PeriodState {
    ports: PortSet,
    scratch: ScratchBuffer,
    capture: Option<SharedCaptureSink>,
    render: Option<SharedRenderSource>,
}

/// Bridge state shared between the control plane and the host callbacks.
struct Shared {
    control: Mutex<ControlState>,
    period: Mutex<PeriodState>,
    healthy: AtomicBool,
    /// Set by the host's shutdown notification; cleared by a fresh open.
    host_lost: AtomicBool,
    sample_rate: AtomicU32,
    /// Latest period length reported by the host.
    host_period: AtomicU32,
    /// Mirrors of `PeriodState` sizes, so status polls never touch the period lock.
    registered_outputs: AtomicUsize,
    scratch_samples: AtomicUsize,
}

impl Shared {
    fn new(settings: BridgeSettings) -> Self {
        Self {
            control: Mutex::new(ControlState {
                client: None,
                active: false,
                channel_count: 1,
                period_length: 0,
                settings,
            }),
            period: Mutex::new(PeriodState::default()),
            healthy: AtomicBool::new(false),
            host_lost: AtomicBool::new(false),
            sample_rate: AtomicU32::new(0),
            host_period: AtomicU32::new(0),
            registered_outputs: AtomicUsize::new(0),
            scratch_samples: AtomicUsize::new(0),
        }
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Release);
    }

    /// Record the port and scratch sizes of `period` for [`status`](Self::status).
    /// Called by the control plane before it releases the period lock.
    fn publish_sizes(&self, period: &PeriodState) {
        self.registered_outputs
            .store(period.ports.output_count(), Ordering::Release);
        self.scratch_samples.store(period.scratch.len(), Ordering::Release);
    }

    fn status(&self) -> BridgeStatus {
        let control = self.control.lock();
        BridgeStatus {
            connected: control.client.is_some(),
            healthy: self.is_healthy(),
            active: control.active,
            output_channels: control.channel_count,
            registered_outputs: self.registered_outputs.load(Ordering::Acquire),
            period_length: control.period_length,
            sample_rate: self.sample_rate.load(Ordering::Acquire),
            scratch_samples: self.scratch_samples.load(Ordering::Acquire),
        }
    }
}

/// Duplex bridge between a host audio graph and a mono-in, multi-out application.
///
/// Owns the host connection, the port set and the scratch buffer. Every method
/// is meant for the control thread; the host drives the real-time side through
/// the callbacks registered on `open`.
pub struct AudioBridge {
    shared: Arc<Shared>,
    server: Arc<dyn AudioServer>,
    store: Arc<dyn SettingsStore>,
}

impl AudioBridge {
    /// Create a disconnected bridge using the settings in `store`.
    pub fn new(
        server: Arc<dyn AudioServer>,
        store: Arc<dyn SettingsStore>,
    ) -> Result<Self, BridgeError> {
        let settings = load_settings(store.as_ref())?;

        Ok(Self {
            shared: Arc::new(Shared::new(settings)),
            server,
            store,
        })
    }

    /// Create a bridge and open it, waiting up to the configured startup
    /// timeout for it to become healthy.
    ///
    /// On timeout this returns at once; the open keeps running on its own
    /// thread and closes the connection itself when it eventually finishes.
    pub fn start(
        server: Arc<dyn AudioServer>,
        store: Arc<dyn SettingsStore>,
    ) -> Result<Self, BridgeError> {
        let settings = load_settings(store.as_ref())?;
        let timeout = Duration::from_millis(settings.startup_timeout_ms);
        let shared = Arc::new(Shared::new(settings));
        let signal = Arc::new(StartupSignal::new());

        let opener = {
            let shared = Arc::clone(&shared);
            let server = Arc::clone(&server);
            let signal = Arc::clone(&signal);
            thread::Builder::new()
                .name("audio-bridge-open".into())
                .spawn(move || {
                    let outcome = shared.open(server.as_ref());
                    if !signal.complete(outcome) {
                        log::info!("audio bridge: closing connection opened after startup timeout");
                        shared.close();
                    }
                })
                .map_err(|e| BridgeError::Unknown(format!("failed to spawn open thread: {}", e)))?
        };

        let Some(outcome) = signal.wait(timeout) else {
            log::warn!(
                "audio bridge: host did not become ready within {} ms",
                timeout.as_millis()
            );
            return Err(BridgeError::StartupTimeout(timeout));
        };
        let _ = opener.join();

        let bridge = Self {
            shared,
            server,
            store,
        };
        outcome?;
        if !bridge.status().is_usable() {
            return Err(BridgeError::Unhealthy);
        }
        Ok(bridge)
    }

    /// Connect to the host, register ports and callbacks.
    ///
    /// Any failure rolls back through [`close`](Self::close). Opening an
    /// already-open bridge is a no-op.
    pub fn open(&self) -> Result<(), BridgeError> {
        self.shared.open(self.server.as_ref())
    }

    /// Deactivate, unregister every port and disconnect. Idempotent.
    pub fn close(&self) {
        self.shared.close();
    }

    /// Join the host's processing graph, then auto-connect if configured.
    ///
    /// A second call while active does nothing.
    pub fn activate(&self) -> Result<(), BridgeError> {
        self.shared.activate().map(|_| ())
    }

    /// Like [`activate`](Self::activate), also returning what auto-connect did
    /// on this call (`None` if already active or auto-connect is off).
    pub fn activate_with_report(&self) -> Result<Option<AutoConnectReport>, BridgeError> {
        self.shared.activate()
    }

    /// Leave the processing graph. Idempotent.
    pub fn deactivate(&self) {
        self.shared.deactivate();
    }

    /// Re-register `n` output ports (clamped to `[1, MAX_OUTPUT_PORTS]`) and
    /// resize the scratch buffer. Returns the effective channel count.
    pub fn set_output_channel_count(&self, n: usize) -> Result<usize, BridgeError> {
        self.shared.set_output_channel_count(n)
    }

    /// Store a user's channel-count choice and apply it.
    pub fn choose_output_channels(&self, choice: &str) -> Result<usize, BridgeError> {
        let settings = {
            let mut control = self.shared.control.lock();
            control.settings.output_channels = choice.to_string();
            control.settings.clone()
        };
        self.store.save(&settings)?;
        self.set_output_channel_count(settings.desired_output_channels())
    }

    /// Install the capture sink. Like every collaborator swap, this briefly
    /// holds the period lock, so a process pass running at that moment skips.
    pub fn attach_capture(&self, sink: SharedCaptureSink) {
        self.shared.period.lock().capture = Some(sink);
    }

    pub fn detach_capture(&self) -> Option<SharedCaptureSink> {
        self.shared.period.lock().capture.take()
    }

    pub fn attach_render(&self, source: SharedRenderSource) {
        self.shared.period.lock().render = Some(source);
    }

    pub fn detach_render(&self) -> Option<SharedRenderSource> {
        self.shared.period.lock().render.take()
    }

    pub fn status(&self) -> BridgeStatus {
        self.shared.status()
    }

    pub fn is_healthy(&self) -> bool {
        self.shared.is_healthy()
    }

    pub fn output_channel_count(&self) -> usize {
        self.shared.control.lock().channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.shared.sample_rate.load(Ordering::Acquire)
    }

    pub fn settings(&self) -> BridgeSettings {
        self.shared.control.lock().settings.clone()
    }
}

fn load_settings(store: &dyn SettingsStore) -> Result<BridgeSettings, BridgeError> {
    let settings = store.load()?;
    settings.validate().map_err(BridgeError::Settings)?;
    Ok(settings)
}

impl Drop for AudioBridge {
    fn drop(&mut self) {
        self.shared.close();
    }
}
