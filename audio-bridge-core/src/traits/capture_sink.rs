use std::sync::Arc;

use parking_lot::Mutex;

/// Consumer of the bridge's mono input stream (e.g. the application's encoder).
///
/// The surrounding `Mutex` in [`SharedCaptureSink`] is the capture data-path
/// lock; the bridge holds it for one delivery per period.
pub trait CaptureSink: Send {
    fn is_running(&self) -> bool;

    fn is_finished(&self) -> bool;

    /// Channels the sink accepts. Zero means it is not ready for samples.
    fn channels(&self) -> u16;

    /// Deliver one period of input. `samples` holds `frames` mono samples.
    fn add_samples(&mut self, samples: &[f32], frames: usize);
}

pub type SharedCaptureSink = Arc<Mutex<dyn CaptureSink>>;
