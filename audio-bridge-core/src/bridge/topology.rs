use std::sync::atomic::Ordering;
use std::time::Duration;

use super::{ControlState, Shared};
use crate::models::error::BridgeError;
use crate::models::port::{clamp_channel_count, output_port_name, PortDirection};

/// How long the period-size callback waits for the state-mutation lock
/// before deferring the resize to the control thread.
pub(super) const CALLBACK_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

impl Shared {
    pub(super) fn set_output_channel_count(&self, requested: usize) -> Result<usize, BridgeError> {
        let mut control = self.control.lock();
        let result = self.reconfigure_outputs(&mut control, requested);
        self.reconcile_period(&mut control);
        result
    }

    /// Replace the output port set with `requested` ports (clamped).
    ///
    /// Registration stops at the first failure, leaving the ports registered
    /// so far in place and the bridge unhealthy.
    pub(super) fn reconfigure_outputs(
        &self,
        control: &mut ControlState,
        requested: usize,
    ) -> Result<usize, BridgeError> {
        let channels = clamp_channel_count(requested);
        let previous = std::mem::replace(&mut control.channel_count, channels);

        let frames = control.period_length;
        if let Err(e) = self.resize_scratch(control, frames) {
            control.channel_count = previous;
            return Err(e);
        }

        let Some(client) = control.client.as_mut() else {
            return Ok(channels);
        };

        let was_active = control.active;
        if was_active {
            if let Err(e) = client.deactivate() {
                log::warn!(
                    "audio bridge: unable to remove client from the process graph - host returned {}",
                    e.code
                );
            }
        }

        let registered = {
            let mut period = self.period.lock();
            for port in period.ports.take_outputs() {
                if let Err(e) = client.unregister_port(port) {
                    log::warn!("audio bridge: unable to unregister out port - host returned {}", e.code);
                }
            }

            let mut outcome = Ok(());
            for index in 0..channels {
                let name = output_port_name(index);
                match client.register_port(&name, PortDirection::Output) {
                    Ok(port) => {
                        period.ports.push_output(port);
                    }
                    Err(e) => {
                        log::warn!(
                            "audio bridge: unable to register '{}' port - host returned {}",
                            name,
                            e.code
                        );
                        self.set_healthy(false);
                        outcome = Err(BridgeError::PortRegistration { port: name, code: e.code });
                        break;
                    }
                }
            }
            self.publish_sizes(&period);
            outcome
        };

        let mut reactivated = Ok(());
        if was_active {
            if let Err(e) = client.activate() {
                log::warn!("audio bridge: unable to activate client - host returned {}", e.code);
                self.set_healthy(false);
                control.active = false;
                reactivated = Err(BridgeError::Activation(e.code));
            }
        }

        registered?;
        reactivated?;

        if !self.host_lost.load(Ordering::Acquire) {
            self.set_healthy(true);
        }
        Ok(channels)
    }

    /// Reallocate the scratch buffer for `frames` periods of the current
    /// channel count, under the render data-path lock.
    pub(super) fn resize_scratch(&self, control: &mut ControlState, frames: u32) -> Result<(), BridgeError> {
        control.period_length = frames;

        let mut period = self.period.lock();
        let period = &mut *period;
        let _render = period.render.as_ref().map(|render| render.lock());

        let resized = period.scratch.resize(frames as usize, control.channel_count);
        self.publish_sizes(period);
        match resized {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!(
                    "audio bridge: unable to allocate scratch buffer of {} samples",
                    e.samples
                );
                self.set_healthy(false);
                Err(BridgeError::Allocation { samples: e.samples })
            }
        }
    }

    /// Bring the scratch buffer in line with the host's latest period length
    /// if a period-size notification could not apply it directly.
    pub(super) fn reconcile_period(&self, control: &mut ControlState) {
        if control.client.is_none() {
            return;
        }
        let frames = self.host_period.load(Ordering::Acquire);
        if frames != control.period_length {
            let _ = self.resize_scratch(control, frames);
        }
    }

    /// Period-size notification from the host thread. Resizes the scratch
    /// buffer only; the port set is left alone.
    pub(super) fn handle_buffer_size_change(&self, frames: u32) {
        self.host_period.store(frames, Ordering::Release);

        match self.control.try_lock_for(CALLBACK_LOCK_TIMEOUT) {
            Some(mut control) => {
                if control.client.is_some() {
                    let _ = self.resize_scratch(&mut control, frames);
                }
            }
            None => log::warn!(
                "audio bridge: control plane busy, deferring scratch resize to {} frames",
                frames
            ),
        }
    }
}
