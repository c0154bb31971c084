//! In-process host audio server for tests and demos.
//!
//! Models the parts of a JACK-style server the bridge relies on: named
//! clients, flagged ports with per-period buffers, connections, activation,
//! and callback dispatch. Faults can be injected at every call the bridge
//! makes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::error::HostError;
use crate::models::port::{PortDirection, PortFlags, PortId, PortInfo};
use crate::models::state::ProcessStatus;
use crate::models::status::HostStatus;
use crate::traits::audio_host::{AudioServer, HostClient, OpenedClient, ServerStartPolicy};
use crate::traits::host_callbacks::HostCallbacks;
use crate::traits::process_scope::ProcessScope;

const ERR_GENERIC: i32 = -1;
const ERR_EXISTS: i32 = -17;
const ERR_INVALID: i32 = -22;

/// Callback registrations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Process,
    SampleRate,
    BufferSize,
}

/// Totals from one or more process cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Process callbacks invoked.
    pub invoked: usize,
    /// Invocations that returned [`ProcessStatus::Failed`].
    pub failed: usize,
}

impl CycleReport {
    fn merge(&mut self, other: CycleReport) {
        self.invoked += other.invoked;
        self.failed += other.failed;
    }
}

struct SimPort {
    id: PortId,
    name: String,
    flags: PortFlags,
    owner: Option<u64>,
    buffer: Vec<f32>,
    available: bool,
    hidden: bool,
}

#[derive(Default)]
struct ClientCallbacks {
    process: Option<Arc<dyn HostCallbacks>>,
    sample_rate: Option<Arc<dyn HostCallbacks>>,
    buffer_size: Option<Arc<dyn HostCallbacks>>,
    shutdown: Option<Arc<dyn HostCallbacks>>,
}

struct ClientSlot {
    id: u64,
    name: String,
    active: bool,
    zombie: bool,
    closed: bool,
    callbacks: ClientCallbacks,
}

#[derive(Default)]
struct Faults {
    open_status: Option<HostStatus>,
    failing_ports: Vec<String>,
    failing_callbacks: Vec<(CallbackKind, i32)>,
    activation: Option<i32>,
    deactivation: Option<i32>,
    refused_sources: Vec<String>,
    refused_destinations: Vec<String>,
    keep_callbacks_on_close: bool,
    open_delay: Option<Duration>,
}

struct Graph {
    buffer_size: u32,
    sample_rate: u32,
    server_running: bool,
    next_id: u64,
    ports: Vec<SimPort>,
    clients: Vec<ClientSlot>,
    connections: Vec<(String, String)>,
    connect_attempts: Vec<(String, String)>,
    input_signal: Vec<f32>,
    faults: Faults,
    cycles: u64,
    opened: usize,
}

impl Graph {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn slot_mut(&mut self, id: u64) -> Option<&mut ClientSlot> {
        self.clients.iter_mut().find(|c| c.id == id)
    }

    fn live_callbacks(&self, pick: fn(&ClientCallbacks) -> Option<&Arc<dyn HostCallbacks>>) -> Vec<Arc<dyn HostCallbacks>> {
        self.clients
            .iter()
            .filter(|c| !c.closed && !c.zombie)
            .filter_map(|c| pick(&c.callbacks).cloned())
            .collect()
    }

    fn port(&self, name: &str) -> Option<&SimPort> {
        self.ports.iter().find(|p| p.name == name)
    }

    fn port_mut(&mut self, name: &str) -> Option<&mut SimPort> {
        self.ports.iter_mut().find(|p| p.name == name)
    }
}

/// A host audio server living entirely in this process.
///
/// Cloning shares the same graph.
#[derive(Clone)]
pub struct SimulatedServer {
    graph: Arc<Mutex<Graph>>,
}

impl SimulatedServer {
    /// A running server with the given period length and sample rate and no ports.
    pub fn new(buffer_size: u32, sample_rate: u32) -> Self {
        Self {
            graph: Arc::new(Mutex::new(Graph {
                buffer_size,
                sample_rate,
                server_running: true,
                next_id: 0,
                ports: Vec::new(),
                clients: Vec::new(),
                connections: Vec::new(),
                connect_attempts: Vec::new(),
                input_signal: Vec::new(),
                faults: Faults::default(),
                cycles: 0,
                opened: 0,
            })),
        }
    }

    /// Like [`new`](Self::new), but no server is running until a client asks
    /// for one to be started.
    pub fn stopped(buffer_size: u32, sample_rate: u32) -> Self {
        let server = Self::new(buffer_size, sample_rate);
        server.graph.lock().server_running = false;
        server
    }

    /// Add a hardware port. `Output` is a capture source, `Input` a playback sink.
    pub fn add_physical_port(&self, name: &str, direction: PortDirection) {
        let mut graph = self.graph.lock();
        let id = PortId(graph.next_id());
        let buffer = vec![0.0; graph.buffer_size as usize];
        graph.ports.push(SimPort {
            id,
            name: name.to_string(),
            flags: direction.flags() | PortFlags::IS_PHYSICAL | PortFlags::IS_TERMINAL,
            owner: None,
            buffer,
            available: true,
            hidden: false,
        });
    }

    /// Samples written into every client input port at the start of a cycle.
    pub fn set_input_signal(&self, samples: Vec<f32>) {
        self.graph.lock().input_signal = samples;
    }

    /// Make a port's buffer unavailable (or available again) to process callbacks.
    pub fn set_port_available(&self, name: &str, available: bool) {
        if let Some(port) = self.graph.lock().port_mut(name) {
            port.available = available;
        }
    }

    /// Keep the port listed by enumeration but make lookups by name fail.
    pub fn hide_port_from_lookup(&self, name: &str) {
        if let Some(port) = self.graph.lock().port_mut(name) {
            port.hidden = true;
        }
    }

    /// Make every `open_client` call take at least `delay`.
    pub fn delay_open(&self, delay: Duration) {
        self.graph.lock().faults.open_delay = Some(delay);
    }

    pub fn fail_open(&self, status: HostStatus) {
        self.graph.lock().faults.open_status = Some(status);
    }

    /// Refuse registration of any port with this short name.
    pub fn fail_port_registration(&self, short_name: &str) {
        self.graph.lock().faults.failing_ports.push(short_name.to_string());
    }

    pub fn clear_port_registration_failures(&self) {
        self.graph.lock().faults.failing_ports.clear();
    }

    pub fn fail_callback_registration(&self, kind: CallbackKind, code: i32) {
        self.graph.lock().faults.failing_callbacks.push((kind, code));
    }

    pub fn fail_activation(&self, code: i32) {
        self.graph.lock().faults.activation = Some(code);
    }

    pub fn fail_deactivation(&self, code: i32) {
        self.graph.lock().faults.deactivation = Some(code);
    }

    pub fn fail_connections_from(&self, source: &str) {
        self.graph.lock().faults.refused_sources.push(source.to_string());
    }

    pub fn fail_connections_to(&self, destination: &str) {
        self.graph.lock().faults.refused_destinations.push(destination.to_string());
    }

    /// Keep invoking a client's process callback after it closes.
    pub fn keep_callbacks_on_close(&self) {
        self.graph.lock().faults.keep_callbacks_on_close = true;
    }

    /// Run one period: fill client inputs, clear client outputs, invoke every
    /// active client's process callback.
    pub fn run_cycle(&self) -> CycleReport {
        let mut guard = self.graph.lock();
        let graph = &mut *guard;
        graph.cycles += 1;

        let frames = graph.buffer_size;
        let targets: Vec<(u64, Arc<dyn HostCallbacks>)> = graph
            .clients
            .iter()
            .filter(|c| (c.active && !c.zombie) || c.closed)
            .filter_map(|c| c.callbacks.process.clone().map(|cb| (c.id, cb)))
            .collect();

        let mut report = CycleReport::default();
        for (owner, callbacks) in targets {
            for port in graph.ports.iter_mut().filter(|p| p.owner == Some(owner)) {
                if port.flags.contains(PortFlags::IS_INPUT) {
                    for (i, sample) in port.buffer.iter_mut().enumerate() {
                        *sample = graph.input_signal.get(i).copied().unwrap_or(0.0);
                    }
                } else {
                    port.buffer.fill(0.0);
                }
            }

            let mut scope = SimulatedScope {
                frames,
                owner,
                ports: &mut graph.ports,
            };
            report.invoked += 1;
            if callbacks.on_process(&mut scope) == ProcessStatus::Failed {
                report.failed += 1;
            }
        }
        report
    }

    /// Change the period length and notify clients.
    pub fn set_buffer_size(&self, frames: u32) {
        let callbacks = {
            let mut graph = self.graph.lock();
            graph.buffer_size = frames;
            for port in graph.ports.iter_mut() {
                port.buffer.resize(frames as usize, 0.0);
            }
            graph.live_callbacks(|c| c.buffer_size.as_ref())
        };
        for cb in callbacks {
            cb.on_buffer_size_changed(frames);
        }
    }

    /// Change the sample rate and notify clients.
    pub fn set_sample_rate(&self, sample_rate: u32) {
        let callbacks = {
            let mut graph = self.graph.lock();
            graph.sample_rate = sample_rate;
            graph.live_callbacks(|c| c.sample_rate.as_ref())
        };
        for cb in callbacks {
            cb.on_sample_rate_changed(sample_rate);
        }
    }

    /// Drop every client without being asked to. Clients become zombies.
    pub fn shutdown(&self) {
        let callbacks = {
            let mut graph = self.graph.lock();
            let callbacks = graph.live_callbacks(|c| c.shutdown.as_ref());
            for client in graph.clients.iter_mut() {
                client.zombie = true;
                client.active = false;
            }
            graph.server_running = false;
            callbacks
        };
        for cb in callbacks {
            cb.on_shutdown();
        }
    }

    /// Run cycles on a background thread until the returned driver is stopped.
    pub fn start_driver(&self, interval: Duration) -> SimulatedDriver {
        let running = Arc::new(AtomicBool::new(true));
        let server = self.clone();
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("simulated-host".into())
            .spawn(move || {
                let mut totals = CycleReport::default();
                while flag.load(Ordering::SeqCst) {
                    totals.merge(server.run_cycle());
                    thread::sleep(interval);
                }
                totals
            })
            .expect("failed to spawn simulated host thread");

        SimulatedDriver {
            running,
            handle: Some(handle),
        }
    }

    /// Current contents of a port's buffer.
    pub fn port_buffer(&self, name: &str) -> Option<Vec<f32>> {
        self.graph.lock().port(name).map(|p| p.buffer.clone())
    }

    /// Full names of the ports a client has registered, in registration order.
    pub fn client_ports(&self, client: &str) -> Vec<String> {
        let graph = self.graph.lock();
        let Some(slot) = graph.clients.iter().find(|c| c.name == client && !c.closed) else {
            return Vec::new();
        };
        graph
            .ports
            .iter()
            .filter(|p| p.owner == Some(slot.id))
            .map(|p| p.name.clone())
            .collect()
    }

    /// Names of clients currently open.
    pub fn clients(&self) -> Vec<String> {
        self.graph
            .lock()
            .clients
            .iter()
            .filter(|c| !c.closed)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn is_active(&self, client: &str) -> bool {
        self.graph
            .lock()
            .clients
            .iter()
            .any(|c| c.name == client && c.active && !c.closed)
    }

    pub fn is_server_running(&self) -> bool {
        self.graph.lock().server_running
    }

    /// Established connections as `(source, destination)`.
    pub fn connections(&self) -> Vec<(String, String)> {
        self.graph.lock().connections.clone()
    }

    /// Every connection attempt, successful or not, in order.
    pub fn connect_attempts(&self) -> Vec<(String, String)> {
        self.graph.lock().connect_attempts.clone()
    }

    /// Clients successfully opened so far, including ones since closed.
    pub fn opened_clients(&self) -> usize {
        self.graph.lock().opened
    }

    pub fn cycles(&self) -> u64 {
        self.graph.lock().cycles
    }
}

impl AudioServer for SimulatedServer {
    fn open_client(&self, name: &str, policy: ServerStartPolicy) -> Result<OpenedClient, HostStatus> {
        let delay = self.graph.lock().faults.open_delay;
        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        let mut graph = self.graph.lock();
        if let Some(status) = graph.faults.open_status {
            return Err(status);
        }

        let mut status = HostStatus::empty();
        if !graph.server_running {
            match policy {
                ServerStartPolicy::FailIfAbsent => {
                    return Err(HostStatus::FAILURE | HostStatus::SERVER_FAILED);
                }
                ServerStartPolicy::AutoStart => {
                    graph.server_running = true;
                    status |= HostStatus::SERVER_STARTED;
                }
            }
        }
        if graph.clients.iter().any(|c| c.name == name && !c.closed) {
            return Err(HostStatus::FAILURE | HostStatus::NAME_NOT_UNIQUE);
        }

        graph.opened += 1;
        let id = graph.next_id();
        graph.clients.push(ClientSlot {
            id,
            name: name.to_string(),
            active: false,
            zombie: false,
            closed: false,
            callbacks: ClientCallbacks::default(),
        });

        Ok(OpenedClient {
            client: Box::new(SimulatedClient {
                graph: Arc::clone(&self.graph),
                id,
                name: name.to_string(),
            }),
            status,
        })
    }
}

/// Background thread running [`SimulatedServer::run_cycle`].
pub struct SimulatedDriver {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<CycleReport>>,
}

impl SimulatedDriver {
    /// Stop the thread and return the accumulated cycle totals.
    ///
    /// Fails if a process callback panicked.
    pub fn stop(mut self) -> thread::Result<CycleReport> {
        self.running.store(false, Ordering::SeqCst);
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(CycleReport::default()),
        }
    }
}

impl Drop for SimulatedDriver {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct SimulatedClient {
    graph: Arc<Mutex<Graph>>,
    id: u64,
    name: String,
}

impl SimulatedClient {
    fn set_callback(
        &mut self,
        kind: CallbackKind,
        callbacks: Arc<dyn HostCallbacks>,
    ) -> Result<(), HostError> {
        let mut graph = self.graph.lock();
        if let Some((_, code)) = graph.faults.failing_callbacks.iter().find(|(k, _)| *k == kind) {
            return Err(HostError::new(*code));
        }
        let slot = graph.slot_mut(self.id).ok_or(HostError::new(ERR_GENERIC))?;
        match kind {
            CallbackKind::Process => slot.callbacks.process = Some(callbacks),
            CallbackKind::SampleRate => slot.callbacks.sample_rate = Some(callbacks),
            CallbackKind::BufferSize => slot.callbacks.buffer_size = Some(callbacks),
        }
        Ok(())
    }
}

impl HostClient for SimulatedClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn buffer_size(&self) -> u32 {
        self.graph.lock().buffer_size
    }

    fn sample_rate(&self) -> u32 {
        self.graph.lock().sample_rate
    }

    fn register_port(&mut self, name: &str, direction: PortDirection) -> Result<PortId, HostError> {
        let mut graph = self.graph.lock();
        if graph.faults.failing_ports.iter().any(|p| p == name) {
            return Err(HostError::new(ERR_GENERIC));
        }
        if graph.slot_mut(self.id).map_or(true, |slot| slot.zombie) {
            return Err(HostError::new(ERR_GENERIC));
        }

        let full_name = format!("{}:{}", self.name, name);
        if graph.port(&full_name).is_some() {
            return Err(HostError::new(ERR_EXISTS));
        }

        let id = PortId(graph.next_id());
        let buffer = vec![0.0; graph.buffer_size as usize];
        graph.ports.push(SimPort {
            id,
            name: full_name,
            flags: direction.flags(),
            owner: Some(self.id),
            buffer,
            available: true,
            hidden: false,
        });
        Ok(id)
    }

    fn unregister_port(&mut self, port: PortId) -> Result<(), HostError> {
        let mut graph = self.graph.lock();
        let index = graph
            .ports
            .iter()
            .position(|p| p.id == port && p.owner == Some(self.id))
            .ok_or(HostError::new(ERR_GENERIC))?;
        let removed = graph.ports.remove(index);
        graph
            .connections
            .retain(|(src, dst)| *src != removed.name && *dst != removed.name);
        Ok(())
    }

    fn port_name(&self, port: PortId) -> Option<String> {
        let graph = self.graph.lock();
        graph.ports.iter().find(|p| p.id == port).map(|p| p.name.clone())
    }

    fn port_by_name(&self, name: &str) -> Option<PortInfo> {
        let graph = self.graph.lock();
        graph.port(name).filter(|p| !p.hidden).map(|p| PortInfo {
            id: p.id,
            name: p.name.clone(),
            flags: p.flags,
        })
    }

    fn ports(&self, type_pattern: &str, flags: PortFlags) -> Vec<String> {
        if !type_pattern.is_empty() && type_pattern != "audio" {
            return Vec::new();
        }
        let graph = self.graph.lock();
        graph
            .ports
            .iter()
            .filter(|p| p.flags.contains(flags))
            .map(|p| p.name.clone())
            .collect()
    }

    fn connect(&mut self, source: &str, destination: &str) -> Result<(), HostError> {
        let mut graph = self.graph.lock();
        graph
            .connect_attempts
            .push((source.to_string(), destination.to_string()));

        if graph.faults.refused_sources.iter().any(|s| s == source)
            || graph.faults.refused_destinations.iter().any(|d| d == destination)
        {
            return Err(HostError::new(ERR_GENERIC));
        }

        let source_ok = graph
            .port(source)
            .is_some_and(|p| p.flags.contains(PortFlags::IS_OUTPUT));
        let destination_ok = graph
            .port(destination)
            .is_some_and(|p| p.flags.contains(PortFlags::IS_INPUT));
        if !source_ok || !destination_ok {
            return Err(HostError::new(ERR_INVALID));
        }

        let pair = (source.to_string(), destination.to_string());
        if graph.connections.contains(&pair) {
            return Err(HostError::new(ERR_EXISTS));
        }
        graph.connections.push(pair);
        Ok(())
    }

    fn set_process_callback(&mut self, callbacks: Arc<dyn HostCallbacks>) -> Result<(), HostError> {
        self.set_callback(CallbackKind::Process, callbacks)
    }

    fn set_sample_rate_callback(&mut self, callbacks: Arc<dyn HostCallbacks>) -> Result<(), HostError> {
        self.set_callback(CallbackKind::SampleRate, callbacks)
    }

    fn set_buffer_size_callback(&mut self, callbacks: Arc<dyn HostCallbacks>) -> Result<(), HostError> {
        self.set_callback(CallbackKind::BufferSize, callbacks)
    }

    fn set_shutdown_callback(&mut self, callbacks: Arc<dyn HostCallbacks>) {
        if let Some(slot) = self.graph.lock().slot_mut(self.id) {
            slot.callbacks.shutdown = Some(callbacks);
        }
    }

    fn activate(&mut self) -> Result<(), HostError> {
        let mut graph = self.graph.lock();
        if let Some(code) = graph.faults.activation {
            return Err(HostError::new(code));
        }
        let slot = graph.slot_mut(self.id).ok_or(HostError::new(ERR_GENERIC))?;
        if slot.zombie {
            return Err(HostError::new(ERR_GENERIC));
        }
        slot.active = true;
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), HostError> {
        // Holding the graph lock waits out any cycle in flight.
        let mut graph = self.graph.lock();
        if let Some(code) = graph.faults.deactivation {
            return Err(HostError::new(code));
        }
        let slot = graph.slot_mut(self.id).ok_or(HostError::new(ERR_GENERIC))?;
        slot.active = false;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), HostError> {
        let mut guard = self.graph.lock();
        let graph = &mut *guard;

        let owned: Vec<String> = graph
            .ports
            .iter()
            .filter(|p| p.owner == Some(self.id))
            .map(|p| p.name.clone())
            .collect();
        graph.ports.retain(|p| p.owner != Some(self.id));
        graph
            .connections
            .retain(|(src, dst)| !owned.contains(src) && !owned.contains(dst));

        if graph.faults.keep_callbacks_on_close {
            if let Some(slot) = graph.slot_mut(self.id) {
                slot.closed = true;
                slot.active = false;
            }
        } else {
            graph.clients.retain(|c| c.id != self.id);
        }
        Ok(())
    }
}

struct SimulatedScope<'g> {
    frames: u32,
    owner: u64,
    ports: &'g mut [SimPort],
}

impl ProcessScope for SimulatedScope<'_> {
    fn n_frames(&self) -> u32 {
        self.frames
    }

    fn input_buffer(&self, port: PortId) -> Option<&[f32]> {
        self.ports
            .iter()
            .find(|p| {
                p.id == port
                    && p.owner == Some(self.owner)
                    && p.flags.contains(PortFlags::IS_INPUT)
                    && p.available
            })
            .map(|p| p.buffer.as_slice())
    }

    fn output_buffers<'a>(&'a mut self, ports: &[PortId], out: &mut [&'a mut [f32]]) -> bool {
        let owner = self.owner;
        let mut found = 0;
        for port in self.ports.iter_mut() {
            if port.owner != Some(owner) || !port.flags.contains(PortFlags::IS_OUTPUT) || !port.available {
                continue;
            }
            let Some(slot) = ports.iter().position(|id| *id == port.id) else {
                continue;
            };
            if let Some(dest) = out.get_mut(slot) {
                *dest = port.buffer.as_mut_slice();
                found += 1;
            }
        }
        found == ports.len()
    }
}
