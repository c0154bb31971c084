use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::{PeriodState, Shared};
use crate::models::port::{PortId, MAX_OUTPUT_PORTS};
use crate::models::state::ProcessStatus;
use crate::processing::interleave::deinterleave;
use crate::traits::host_callbacks::HostCallbacks;
use crate::traits::process_scope::ProcessScope;

/// Callback object handed to the host. Holds the bridge's shared state
/// directly, so no global lookup is needed on the real-time thread.
pub(super) struct BridgeCallbacks {
    shared: Arc<Shared>,
}

impl BridgeCallbacks {
    pub(super) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }
}

impl HostCallbacks for BridgeCallbacks {
    fn on_process(&self, scope: &mut dyn ProcessScope) -> ProcessStatus {
        process(&self.shared, scope)
    }

    fn on_sample_rate_changed(&self, sample_rate: u32) {
        self.shared.sample_rate.store(sample_rate, Ordering::Release);
    }

    fn on_buffer_size_changed(&self, frames: u32) {
        self.shared.handle_buffer_size_change(frames);
    }

    fn on_shutdown(&self) {
        self.shared.host_lost.store(true, Ordering::Release);
        self.shared.set_healthy(false);
    }
}

/// Service one period. Never blocks on the state-mutation lock and never allocates.
fn process(shared: &Shared, scope: &mut dyn ProcessScope) -> ProcessStatus {
    if !shared.is_healthy() {
        return ProcessStatus::Continue;
    }
    // Contention means the control plane is mid-reconfiguration.
    let Some(mut period) = shared.period.try_lock() else {
        return ProcessStatus::Continue;
    };
    let period = &mut *period;
    let frames = scope.n_frames() as usize;

    deliver_capture(period, scope, frames);
    render_outputs(period, scope, frames)
}

fn deliver_capture(period: &PeriodState, scope: &mut dyn ProcessScope, frames: usize) {
    let (Some(capture), Some(input)) = (period.capture.as_ref(), period.ports.input()) else {
        return;
    };

    let mut sink = capture.lock();
    if !sink.is_running() || sink.channels() == 0 || sink.is_finished() {
        return;
    }
    if let Some(samples) = scope.input_buffer(input) {
        let n = frames.min(samples.len());
        sink.add_samples(&samples[..n], n);
    }
}

fn render_outputs(period: &mut PeriodState, scope: &mut dyn ProcessScope, frames: usize) -> ProcessStatus {
    let Some(render) = period.render.as_ref() else {
        return ProcessStatus::Continue;
    };

    let mut source = render.lock();
    if !source.is_running() || source.channels() == 0 || source.is_finished() {
        return ProcessStatus::Continue;
    }

    let mut ports = [PortId(0); MAX_OUTPUT_PORTS];
    let channels = period.ports.copy_outputs(&mut ports);
    if channels == 0 {
        return ProcessStatus::Continue;
    }

    let mut buffers: [&mut [f32]; MAX_OUTPUT_PORTS] = Default::default();
    if !scope.output_buffers(&ports[..channels], &mut buffers[..channels]) {
        return ProcessStatus::Failed;
    }

    // A period longer than the scratch buffer was sized for: skip until the
    // pending resize lands.
    let Some(mix) = period.scratch.prefix_mut(frames * channels) else {
        return ProcessStatus::Continue;
    };
    mix.fill(0.0);
    source.mix(mix, frames);
    deinterleave(mix, &mut buffers[..channels]);

    ProcessStatus::Continue
}
