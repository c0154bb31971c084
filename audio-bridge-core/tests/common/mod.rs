#![allow(dead_code)]

use std::sync::Arc;

use audio_bridge_core::testing::SimulatedServer;
use audio_bridge_core::{AudioBridge, BridgeSettings, MemorySettingsStore, PortDirection};

pub const CLIENT: &str = "audio-bridge";
pub const FRAMES: u32 = 64;
pub const RATE: u32 = 48000;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn settings(channels: &str, auto_connect: bool) -> BridgeSettings {
    BridgeSettings {
        output_channels: channels.into(),
        auto_connect,
        ..BridgeSettings::default()
    }
}

pub fn bridge(server: &SimulatedServer, settings: BridgeSettings) -> (AudioBridge, Arc<MemorySettingsStore>) {
    init_logging();
    let store = Arc::new(MemorySettingsStore::new(settings));
    let bridge = AudioBridge::new(Arc::new(server.clone()), store.clone()).unwrap();
    (bridge, store)
}

/// A server with `captures` physical sources and `playbacks` physical sinks.
pub fn server_with_hardware(captures: usize, playbacks: usize) -> SimulatedServer {
    let server = SimulatedServer::new(FRAMES, RATE);
    for i in 1..=captures {
        server.add_physical_port(&format!("system:capture_{}", i), PortDirection::Output);
    }
    for i in 1..=playbacks {
        server.add_physical_port(&format!("system:playback_{}", i), PortDirection::Input);
    }
    server
}

pub fn port(short: &str) -> String {
    format!("{}:{}", CLIENT, short)
}

pub fn expected_ports(outputs: usize) -> Vec<String> {
    let mut names = vec![port("input")];
    names.extend((1..=outputs).map(|i| port(&format!("output_{}", i))));
    names
}
