use crate::models::port::PortId;

/// Per-period view of the host's port buffers.
///
/// Only valid for the duration of one process callback.
pub trait ProcessScope {
    /// Frames in this period.
    fn n_frames(&self) -> u32;

    /// Samples arriving on an input port, or `None` if the host has no buffer for it.
    fn input_buffer(&self, port: PortId) -> Option<&[f32]>;

    /// Fill `out[i]` with the buffer of output port `ports[i]`.
    ///
    /// Returns `false` if any requested buffer is unavailable; `out` contents
    /// are unspecified in that case.
    fn output_buffers<'a>(&'a mut self, ports: &[PortId], out: &mut [&'a mut [f32]]) -> bool;
}
