use crate::models::state::ProcessStatus;
use crate::traits::process_scope::ProcessScope;

/// Notifications the host delivers to a client.
///
/// All methods are called on the host's own thread. `on_process` runs on the
/// real-time thread and must neither block nor allocate.
pub trait HostCallbacks: Send + Sync {
    /// Service one period.
    fn on_process(&self, scope: &mut dyn ProcessScope) -> ProcessStatus;

    /// Called when the graph's sample rate changes.
    fn on_sample_rate_changed(&self, sample_rate: u32);

    /// Called when the number of frames per period changes.
    fn on_buffer_size_changed(&self, frames: u32);

    /// Called when the host drops the client without being asked to.
    fn on_shutdown(&self);
}
