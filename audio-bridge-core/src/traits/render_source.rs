use std::sync::Arc;

use parking_lot::Mutex;

/// Producer of the mixed output the bridge plays (e.g. the application's speaker mix).
///
/// The surrounding `Mutex` in [`SharedRenderSource`] is the render data-path
/// lock. The bridge also takes it while swapping its scratch buffer.
pub trait RenderSource: Send {
    fn is_running(&self) -> bool;

    fn is_finished(&self) -> bool;

    /// Channels the source declares. Zero means it has nothing to play.
    fn channels(&self) -> u16;

    /// Fill `buffer` with `frames` interleaved frames.
    ///
    /// `buffer` is zeroed beforehand and holds `frames * channels` samples,
    /// where `channels` is the bridge's output channel count. Returns whether
    /// anything audible was written.
    fn mix(&mut self, buffer: &mut [f32], frames: usize) -> bool;
}

pub type SharedRenderSource = Arc<Mutex<dyn RenderSource>>;
