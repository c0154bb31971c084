use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::auto_connect::{auto_connect, AutoConnectReport};
use super::engine::BridgeCallbacks;
use super::{ControlState, Shared};
use crate::models::error::BridgeError;
use crate::models::port::{PortDirection, INPUT_PORT_NAME};
use crate::models::status::HostStatus;
use crate::traits::audio_host::{AudioServer, ServerStartPolicy};
use crate::traits::host_callbacks::HostCallbacks;

impl Shared {
    pub(super) fn open(self: &Arc<Self>, server: &dyn AudioServer) -> Result<(), BridgeError> {
        let mut control = self.control.lock();
        if control.client.is_some() {
            return Ok(());
        }

        let result = self.open_locked(&mut control, server);
        if result.is_err() {
            self.close_locked(&mut control);
        } else {
            self.reconcile_period(&mut control);
        }
        result
    }

    fn open_locked(
        self: &Arc<Self>,
        control: &mut ControlState,
        server: &dyn AudioServer,
    ) -> Result<(), BridgeError> {
        let policy = if control.settings.start_server {
            ServerStartPolicy::AutoStart
        } else {
            ServerStartPolicy::FailIfAbsent
        };

        let opened = match server.open_client(&control.settings.client_name, policy) {
            Ok(opened) => opened,
            Err(status) => {
                log_open_failure(status);
                self.set_healthy(false);
                return Err(BridgeError::ConnectionFailed(status));
            }
        };
        if opened.status.contains(HostStatus::SERVER_STARTED) {
            log::info!("audio bridge: host server was started for this client");
        }
        if opened.status.is_failure() {
            log::warn!(
                "audio bridge: host opened the client but reported: {}",
                opened.status
            );
        }

        let mut client = opened.client;
        log::info!("audio bridge: connected to host as '{}'", client.name());
        match client.register_port(INPUT_PORT_NAME, PortDirection::Input) {
            Ok(port) => self.period.lock().ports.set_input(port),
            Err(e) => {
                log::warn!(
                    "audio bridge: unable to register '{}' port - host returned {}",
                    INPUT_PORT_NAME,
                    e.code
                );
                control.client = Some(client);
                return Err(BridgeError::PortRegistration {
                    port: INPUT_PORT_NAME.into(),
                    code: e.code,
                });
            }
        }

        let frames = client.buffer_size();
        control.period_length = frames;
        self.host_period.store(frames, Ordering::Release);
        self.sample_rate.store(client.sample_rate(), Ordering::Release);
        control.client = Some(client);
        self.host_lost.store(false, Ordering::Release);
        self.set_healthy(true);

        let requested = control.settings.desired_output_channels();
        self.reconfigure_outputs(control, requested)?;
        if !self.is_healthy() {
            return Err(BridgeError::Unhealthy);
        }

        let callbacks: Arc<dyn HostCallbacks> = Arc::new(BridgeCallbacks::new(Arc::clone(self)));
        let client = control.client.as_mut().ok_or(BridgeError::NotConnected)?;

        client
            .set_process_callback(Arc::clone(&callbacks))
            .map_err(|e| callback_failure("process", e.code))?;
        client
            .set_sample_rate_callback(Arc::clone(&callbacks))
            .map_err(|e| callback_failure("sample rate", e.code))?;
        client
            .set_buffer_size_callback(Arc::clone(&callbacks))
            .map_err(|e| callback_failure("buffer size", e.code))?;
        client.set_shutdown_callback(callbacks);

        Ok(())
    }

    pub(super) fn close(&self) {
        let mut control = self.control.lock();
        self.close_locked(&mut control);
    }

    pub(super) fn close_locked(&self, control: &mut ControlState) {
        if let Some(mut client) = control.client.take() {
            if let Err(e) = client.deactivate() {
                log::warn!(
                    "audio bridge: unable to remove client from the process graph - host returned {}",
                    e.code
                );
            }
            control.active = false;

            {
                let mut period = self.period.lock();
                if let Some(port) = period.ports.take_input() {
                    if let Err(e) = client.unregister_port(port) {
                        log::warn!("audio bridge: unable to unregister in port - host returned {}", e.code);
                    }
                }
                for port in period.ports.take_outputs() {
                    if let Err(e) = client.unregister_port(port) {
                        log::warn!("audio bridge: unable to unregister out port - host returned {}", e.code);
                    }
                }
                period.scratch.release();
                self.publish_sizes(&period);
            }

            if let Err(e) = client.close() {
                log::warn!(
                    "audio bridge: unable to disconnect from the host server - host returned {}",
                    e.code
                );
            }
        }
        self.set_healthy(false);
    }

    /// Returns the auto-connect report when this call performed the transition.
    pub(super) fn activate(&self) -> Result<Option<AutoConnectReport>, BridgeError> {
        let mut control = self.control.lock();
        let control = &mut *control;
        let Some(client) = control.client.as_mut() else {
            return Err(BridgeError::NotConnected);
        };
        if control.active {
            return Ok(None);
        }

        if let Err(e) = client.activate() {
            log::warn!("audio bridge: unable to activate client - host returned {}", e.code);
            self.set_healthy(false);
            return Err(BridgeError::Activation(e.code));
        }
        control.active = true;

        let report = if control.settings.auto_connect {
            let ports = self.period.lock().ports;
            let report = auto_connect(client.as_mut(), &ports);
            log::debug!(
                "audio bridge: auto-connect made {} input and {} output connections ({} attempts, {} skipped)",
                u8::from(report.input_connected),
                report.outputs_connected,
                report.attempts,
                report.skipped
            );
            Some(report)
        } else {
            None
        };

        self.reconcile_period(control);
        Ok(report)
    }

    pub(super) fn deactivate(&self) {
        let mut control = self.control.lock();
        if !control.active {
            return;
        }
        if let Some(client) = control.client.as_mut() {
            if let Err(e) = client.deactivate() {
                log::warn!(
                    "audio bridge: unable to remove client from the process graph - host returned {}",
                    e.code
                );
            }
        }
        control.active = false;
    }
}

fn log_open_failure(status: HostStatus) {
    let errors = status.descriptions();
    log::warn!(
        "audio bridge: unable to open host client due to {} errors:",
        errors.len()
    );
    for error in errors {
        log::warn!("audio bridge:  {}", error);
    }
}

fn callback_failure(callback: &'static str, code: i32) -> BridgeError {
    log::warn!(
        "audio bridge: unable to set {} callback - host returned {}",
        callback,
        code
    );
    BridgeError::CallbackRegistration { callback, code }
}
