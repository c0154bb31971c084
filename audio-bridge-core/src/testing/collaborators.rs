use crate::traits::capture_sink::CaptureSink;
use crate::traits::render_source::RenderSource;

/// Capture sink that keeps everything it is handed.
pub struct RecordingCapture {
    running: bool,
    finished: bool,
    samples: Vec<f32>,
    deliveries: usize,
}

impl RecordingCapture {
    pub fn new() -> Self {
        Self {
            running: true,
            finished: false,
            samples: Vec::with_capacity(1 << 16),
            deliveries: 0,
        }
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn set_finished(&mut self, finished: bool) {
        self.finished = finished;
    }

    /// Number of `add_samples` calls received.
    pub fn deliveries(&self) -> usize {
        self.deliveries
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

impl Default for RecordingCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSink for RecordingCapture {
    fn is_running(&self) -> bool {
        self.running
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn channels(&self) -> u16 {
        1
    }

    fn add_samples(&mut self, samples: &[f32], frames: usize) {
        self.samples.extend_from_slice(&samples[..frames.min(samples.len())]);
        self.deliveries += 1;
    }
}

/// Render source writing each sample's interleaved index into it.
///
/// After de-interleaving over `n` ports, port `c` frame `f` holds `f * n + c`.
pub struct IndexRampSource {
    channels: u16,
    running: bool,
    finished: bool,
    mix_calls: usize,
}

impl IndexRampSource {
    pub fn new(channels: u16) -> Self {
        Self {
            channels,
            running: true,
            finished: false,
            mix_calls: 0,
        }
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn set_finished(&mut self, finished: bool) {
        self.finished = finished;
    }

    pub fn mix_calls(&self) -> usize {
        self.mix_calls
    }
}

impl RenderSource for IndexRampSource {
    fn is_running(&self) -> bool {
        self.running
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn mix(&mut self, buffer: &mut [f32], _frames: usize) -> bool {
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample = i as f32;
        }
        self.mix_calls += 1;
        true
    }
}
