use std::sync::Arc;

use crate::models::error::HostError;
use crate::models::port::{PortDirection, PortFlags, PortId, PortInfo};
use crate::models::status::HostStatus;
use crate::traits::host_callbacks::HostCallbacks;

/// What to do when no host server is running at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStartPolicy {
    /// Fail the open with `SERVER_FAILED`.
    FailIfAbsent,
    /// Start a server and report `SERVER_STARTED`.
    AutoStart,
}

/// A successfully opened client plus the status bits reported alongside it.
pub struct OpenedClient {
    pub client: Box<dyn HostClient>,
    pub status: HostStatus,
}

/// Entry point into a host audio server.
///
/// Implemented by a real server binding, or by the simulated server in the
/// `testing` module.
pub trait AudioServer: Send + Sync {
    /// Open a named client. On failure, every status bit the host reported is returned.
    fn open_client(&self, name: &str, policy: ServerStartPolicy) -> Result<OpenedClient, HostStatus>;
}

/// One open connection to the host audio graph.
///
/// All methods are called from the control thread, never from inside a
/// process callback.
pub trait HostClient: Send {
    /// Full name of this client as known to the host.
    fn name(&self) -> &str;

    /// Frames per period.
    fn buffer_size(&self) -> u32;

    fn sample_rate(&self) -> u32;

    fn register_port(&mut self, name: &str, direction: PortDirection) -> Result<PortId, HostError>;

    fn unregister_port(&mut self, port: PortId) -> Result<(), HostError>;

    /// Full `client:port` name of a port, if it still exists.
    fn port_name(&self, port: PortId) -> Option<String>;

    /// Resolve a full port name to its current handle and flags.
    fn port_by_name(&self, name: &str) -> Option<PortInfo>;

    /// Names of all ports of `type_pattern` carrying every flag in `flags`,
    /// in host order.
    fn ports(&self, type_pattern: &str, flags: PortFlags) -> Vec<String>;

    /// Connect an output port (`source`) to an input port (`destination`).
    fn connect(&mut self, source: &str, destination: &str) -> Result<(), HostError>;

    fn set_process_callback(&mut self, callbacks: Arc<dyn HostCallbacks>) -> Result<(), HostError>;

    fn set_sample_rate_callback(&mut self, callbacks: Arc<dyn HostCallbacks>) -> Result<(), HostError>;

    fn set_buffer_size_callback(&mut self, callbacks: Arc<dyn HostCallbacks>) -> Result<(), HostError>;

    fn set_shutdown_callback(&mut self, callbacks: Arc<dyn HostCallbacks>);

    /// Join the processing graph. The process callback may fire as soon as this returns.
    fn activate(&mut self) -> Result<(), HostError>;

    /// Leave the processing graph. Returns only once no process callback is in flight.
    fn deactivate(&mut self) -> Result<(), HostError>;

    /// Disconnect from the server, releasing every registration.
    fn close(self: Box<Self>) -> Result<(), HostError>;
}
