mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use audio_bridge_core::testing::{CallbackKind, IndexRampSource, SimulatedServer};
use audio_bridge_core::{
    AudioBridge, BridgeError, BridgePhase, BridgeSettings, HostStatus, JsonSettingsStore,
    MemorySettingsStore, SettingsStore,
};
use common::*;

#[test]
fn open_registers_ports_and_reports_host_parameters() {
    let server = SimulatedServer::new(FRAMES, RATE);
    let (bridge, _) = bridge(&server, settings("2", false));

    bridge.open().unwrap();

    let status = bridge.status();
    assert_eq!(status.phase(), BridgePhase::Connected);
    assert_eq!(status.period_length, FRAMES);
    assert_eq!(status.sample_rate, RATE);
    assert_eq!(status.registered_outputs, 2);
    assert!(status.scratch_samples >= FRAMES as usize * 2);
    assert_eq!(server.client_ports(CLIENT), expected_ports(2));
}

#[test]
fn open_failure_reports_every_status_bit() {
    let server = SimulatedServer::new(FRAMES, RATE);
    let status = HostStatus::FAILURE | HostStatus::SERVER_ERROR | HostStatus::SHM_FAILURE;
    server.fail_open(status);
    let (bridge, _) = bridge(&server, settings("1", false));

    assert_eq!(bridge.open(), Err(BridgeError::ConnectionFailed(status)));
    assert!(!bridge.is_healthy());
    assert_eq!(bridge.status().phase(), BridgePhase::Disconnected);
}

#[test]
fn duplicate_client_name_is_refused() {
    let server = SimulatedServer::new(FRAMES, RATE);
    let (first, _) = bridge(&server, settings("1", false));
    let (second, _) = bridge(&server, settings("1", false));

    first.open().unwrap();
    let err = second.open().unwrap_err();

    assert_eq!(
        err,
        BridgeError::ConnectionFailed(HostStatus::FAILURE | HostStatus::NAME_NOT_UNIQUE)
    );
    assert!(first.is_healthy());
    assert_eq!(server.client_ports(CLIENT), expected_ports(1));
}

#[test]
fn absent_server_is_started_only_when_configured() {
    let server = SimulatedServer::stopped(FRAMES, RATE);

    let (refusing, _) = bridge(&server, settings("1", false));
    assert_eq!(
        refusing.open(),
        Err(BridgeError::ConnectionFailed(
            HostStatus::FAILURE | HostStatus::SERVER_FAILED
        ))
    );

    let starting_settings = BridgeSettings {
        start_server: true,
        ..settings("1", false)
    };
    let (starting, _) = bridge(&server, starting_settings);
    starting.open().unwrap();

    assert!(server.is_server_running());
    assert!(starting.is_healthy());
}

#[test]
fn callback_registration_failure_rolls_back() {
    let server = SimulatedServer::new(FRAMES, RATE);
    server.fail_callback_registration(CallbackKind::BufferSize, -5);
    let (bridge, _) = bridge(&server, settings("3", false));

    let err = bridge.open().unwrap_err();

    assert_eq!(
        err,
        BridgeError::CallbackRegistration {
            callback: "buffer size",
            code: -5
        }
    );
    assert!(server.clients().is_empty());
    assert!(server.client_ports(CLIENT).is_empty());
    let status = bridge.status();
    assert!(!status.connected);
    assert_eq!(status.registered_outputs, 0);
    assert_eq!(status.scratch_samples, 0);
}

#[test]
fn output_registration_failure_during_open_rolls_back() {
    let server = SimulatedServer::new(FRAMES, RATE);
    server.fail_port_registration("output_2");
    let (bridge, _) = bridge(&server, settings("2", false));

    let err = bridge.open().unwrap_err();

    assert!(matches!(err, BridgeError::PortRegistration { ref port, .. } if port == "output_2"));
    assert!(server.clients().is_empty());
    assert!(!bridge.is_healthy());
}

#[test]
fn activate_requires_an_open_client() {
    let server = SimulatedServer::new(FRAMES, RATE);
    let (bridge, _) = bridge(&server, settings("1", false));

    assert_eq!(bridge.activate(), Err(BridgeError::NotConnected));
}

#[test]
fn activate_is_idempotent() {
    let server = server_with_hardware(2, 2);
    let (bridge, _) = bridge(&server, settings("2", true));
    bridge.open().unwrap();

    let first = bridge.activate_with_report().unwrap().unwrap();
    let attempts = server.connect_attempts();
    let second = bridge.activate_with_report().unwrap();

    assert!(first.input_connected);
    assert_eq!(first.outputs_connected, 2);
    assert_eq!(second, None);
    assert_eq!(server.connect_attempts(), attempts);
    assert_eq!(bridge.status().phase(), BridgePhase::Active);
    assert!(server.is_active(CLIENT));
}

#[test]
fn auto_connect_wires_outputs_in_order() {
    let server = server_with_hardware(1, 4);
    let (bridge, _) = bridge(&server, settings("2", true));
    bridge.open().unwrap();

    bridge.activate().unwrap();

    assert_eq!(
        server.connections(),
        vec![
            ("system:capture_1".to_string(), port("input")),
            (port("output_1"), "system:playback_1".to_string()),
            (port("output_2"), "system:playback_2".to_string()),
        ]
    );
}

#[test]
fn auto_connect_can_be_disabled() {
    let server = server_with_hardware(1, 1);
    let (bridge, _) = bridge(&server, settings("1", false));
    bridge.open().unwrap();

    assert_eq!(bridge.activate_with_report().unwrap(), None);
    assert!(server.connect_attempts().is_empty());
}

#[test]
fn activation_failure_marks_the_bridge_unhealthy() {
    let server = SimulatedServer::new(FRAMES, RATE);
    server.fail_activation(-3);
    let (bridge, _) = bridge(&server, settings("1", false));
    bridge.open().unwrap();

    assert_eq!(bridge.activate(), Err(BridgeError::Activation(-3)));
    assert_eq!(bridge.status().phase(), BridgePhase::Failed);
}

#[test]
fn close_is_idempotent_and_releases_everything() {
    let server = server_with_hardware(1, 1);
    let (bridge, _) = bridge(&server, settings("2", true));
    bridge.open().unwrap();
    bridge.activate().unwrap();

    bridge.close();
    bridge.close();

    assert!(server.clients().is_empty());
    assert!(server.connections().is_empty());
    let status = bridge.status();
    assert_eq!(status.phase(), BridgePhase::Disconnected);
    assert_eq!(status.registered_outputs, 0);
    assert_eq!(status.scratch_samples, 0);
}

#[test]
fn deactivation_failure_does_not_stop_close() {
    let server = SimulatedServer::new(FRAMES, RATE);
    let (bridge, _) = bridge(&server, settings("1", false));
    bridge.open().unwrap();
    bridge.activate().unwrap();
    server.fail_deactivation(-9);

    bridge.close();

    assert!(server.clients().is_empty());
    assert!(!bridge.status().connected);
}

#[test]
fn process_after_close_is_a_no_op() {
    let server = SimulatedServer::new(FRAMES, RATE);
    server.keep_callbacks_on_close();
    let (bridge, _) = bridge(&server, settings("1", false));
    bridge.open().unwrap();
    bridge.activate().unwrap();
    let source = Arc::new(Mutex::new(IndexRampSource::new(1)));
    bridge.attach_render(source.clone());

    bridge.close();
    let report = server.run_cycle();

    assert_eq!(report.invoked, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(source.lock().mix_calls(), 0);
}

#[test]
fn host_shutdown_makes_the_bridge_unhealthy() {
    let server = SimulatedServer::new(FRAMES, RATE);
    let (bridge, _) = bridge(&server, settings("2", false));
    bridge.open().unwrap();
    bridge.activate().unwrap();

    server.shutdown();

    assert!(!bridge.is_healthy());
    assert_eq!(bridge.status().phase(), BridgePhase::Failed);

    // A reconfiguration cannot bring a lost host back.
    assert!(bridge.set_output_channel_count(1).is_err());
    assert!(!bridge.is_healthy());

    bridge.close();
    assert!(!bridge.status().connected);
}

#[test]
fn sample_rate_changes_are_tracked() {
    let server = SimulatedServer::new(FRAMES, RATE);
    let (bridge, _) = bridge(&server, settings("1", false));
    bridge.open().unwrap();

    server.set_sample_rate(44100);

    assert_eq!(bridge.sample_rate(), 44100);
    assert_eq!(bridge.status().sample_rate, 44100);
}

#[test]
fn start_opens_and_waits_for_health() {
    init_logging();
    let server = SimulatedServer::new(FRAMES, RATE);
    let store = Arc::new(MemorySettingsStore::new(settings("2", false)));

    let bridge = AudioBridge::start(Arc::new(server.clone()), store).unwrap();

    assert!(bridge.is_healthy());
    assert_eq!(bridge.output_channel_count(), 2);
    assert_eq!(server.clients(), vec![CLIENT.to_string()]);
}

#[test]
fn start_surfaces_open_errors() {
    init_logging();
    let server = SimulatedServer::new(FRAMES, RATE);
    server.fail_open(HostStatus::FAILURE | HostStatus::SERVER_FAILED);
    let store = Arc::new(MemorySettingsStore::new(settings("1", false)));

    let result = AudioBridge::start(Arc::new(server.clone()), store);

    assert!(matches!(result, Err(BridgeError::ConnectionFailed(_))));
}

#[test]
fn start_times_out_without_waiting_for_the_open() {
    init_logging();
    let server = SimulatedServer::new(FRAMES, RATE);
    server.delay_open(Duration::from_millis(400));
    let store = Arc::new(MemorySettingsStore::new(BridgeSettings {
        startup_timeout_ms: 20,
        ..settings("1", false)
    }));

    let started = Instant::now();
    let result = AudioBridge::start(Arc::new(server.clone()), store);
    let elapsed = started.elapsed();

    assert!(matches!(
        result,
        Err(BridgeError::StartupTimeout(timeout)) if timeout == Duration::from_millis(20)
    ));
    assert!(elapsed < Duration::from_millis(250), "start blocked for {:?}", elapsed);

    // The late open still completes, then closes its own connection.
    let deadline = Instant::now() + Duration::from_secs(5);
    while !(server.opened_clients() == 1 && server.clients().is_empty()) {
        assert!(Instant::now() < deadline, "late open was never cleaned up");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn invalid_settings_are_rejected() {
    let server = SimulatedServer::new(FRAMES, RATE);
    let store = Arc::new(MemorySettingsStore::new(BridgeSettings {
        client_name: String::new(),
        ..BridgeSettings::default()
    }));

    let result = AudioBridge::new(Arc::new(server), store);

    assert!(matches!(result, Err(BridgeError::Settings(_))));
}

#[test]
fn channel_choice_is_persisted_and_applied() {
    let server = SimulatedServer::new(FRAMES, RATE);
    let (bridge, store) = bridge(&server, settings("", false));
    bridge.open().unwrap();
    assert_eq!(bridge.output_channel_count(), 1);

    assert_eq!(bridge.choose_output_channels("4"), Ok(4));

    assert_eq!(store.snapshot().output_channels, "4");
    assert_eq!(server.client_ports(CLIENT), expected_ports(4));
}

#[test]
fn channel_choice_survives_a_restart() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bridge").join("settings.json");
    let server = SimulatedServer::new(FRAMES, RATE);

    {
        let store = Arc::new(JsonSettingsStore::new(&path));
        let bridge = AudioBridge::new(Arc::new(server.clone()), store).unwrap();
        bridge.open().unwrap();
        bridge.choose_output_channels("3").unwrap();
    }
    assert!(server.clients().is_empty());

    let store = Arc::new(JsonSettingsStore::new(&path));
    assert_eq!(store.load().unwrap().output_channels, "3");
    let bridge = AudioBridge::new(Arc::new(server.clone()), store).unwrap();
    bridge.open().unwrap();

    assert_eq!(bridge.output_channel_count(), 3);
}
