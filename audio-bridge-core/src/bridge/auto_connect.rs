use crate::models::port::PortFlags;
use crate::processing::port_set::PortSet;
use crate::traits::audio_host::HostClient;

/// Upper bound on enumerated entries the scan will look at.
pub const MAX_AUTO_CONNECT_ENTRIES: usize = 256;

/// What one auto-connect pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoConnectReport {
    /// A physical capture port was connected to the bridge input.
    pub input_connected: bool,
    /// Bridge outputs connected to physical playback ports.
    pub outputs_connected: usize,
    /// Connection attempts made, successful or not.
    pub attempts: usize,
    /// Enumerated entries that could not be resolved and were skipped.
    pub skipped: usize,
}

/// Wire the bridge's ports to physical hardware ports, best effort.
///
/// The first physical source feeds the bridge input; physical sinks are
/// taken in enumeration order for output 1, 2, ... until every output is
/// connected. Failures are logged and the scan continues.
pub(super) fn auto_connect(client: &mut dyn HostClient, ports: &PortSet) -> AutoConnectReport {
    let mut report = AutoConnectReport::default();

    let input_name = ports.input().and_then(|port| client.port_name(port));
    let channels = ports.output_count();

    let wanted_source = PortFlags::IS_PHYSICAL | PortFlags::IS_OUTPUT;
    let wanted_sink = PortFlags::IS_PHYSICAL | PortFlags::IS_INPUT;

    let physical = client.ports("audio", PortFlags::IS_PHYSICAL);
    if physical.len() > MAX_AUTO_CONNECT_ENTRIES {
        log::warn!(
            "audio bridge: host listed {} physical ports, only the first {} are considered",
            physical.len(),
            MAX_AUTO_CONNECT_ENTRIES
        );
    }

    for name in physical.iter().take(MAX_AUTO_CONNECT_ENTRIES) {
        let Some(info) = client.port_by_name(name) else {
            log::warn!("audio bridge: port '{}' could not be resolved - skipping it", name);
            report.skipped += 1;
            continue;
        };

        if info.flags.contains(wanted_source) && !report.input_connected {
            let Some(input) = input_name.as_deref() else {
                continue;
            };
            report.attempts += 1;
            match client.connect(name, input) {
                Ok(()) => report.input_connected = true,
                Err(e) => log::warn!(
                    "audio bridge: unable to connect port '{}' to '{}' - host returned {}",
                    name,
                    input,
                    e.code
                ),
            }
        } else if info.flags.contains(wanted_sink) && report.outputs_connected < channels {
            let Some(output) = ports
                .output(report.outputs_connected)
                .and_then(|port| client.port_name(port))
            else {
                continue;
            };
            report.attempts += 1;
            match client.connect(&output, name) {
                Ok(()) => report.outputs_connected += 1,
                Err(e) => log::warn!(
                    "audio bridge: unable to connect port '{}' to '{}' - host returned {}",
                    output,
                    name,
                    e.code
                ),
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::port::PortDirection;
    use crate::testing::SimulatedServer;
    use crate::traits::audio_host::{AudioServer, ServerStartPolicy};

    fn bridge_ports(client: &mut dyn HostClient, outputs: usize) -> PortSet {
        let mut ports = PortSet::new();
        ports.set_input(client.register_port("input", PortDirection::Input).unwrap());
        for i in 0..outputs {
            let name = format!("output_{}", i + 1);
            ports.push_output(client.register_port(&name, PortDirection::Output).unwrap());
        }
        ports
    }

    fn open(server: &SimulatedServer) -> Box<dyn HostClient> {
        server
            .open_client("bridge", ServerStartPolicy::FailIfAbsent)
            .unwrap()
            .client
    }

    #[test]
    fn one_input_and_one_output_for_mono() {
        let server = SimulatedServer::new(64, 48000);
        server.add_physical_port("system:capture_1", PortDirection::Output);
        server.add_physical_port("system:capture_2", PortDirection::Output);
        server.add_physical_port("system:playback_1", PortDirection::Input);
        let mut client = open(&server);
        let ports = bridge_ports(client.as_mut(), 1);

        let report = auto_connect(client.as_mut(), &ports);

        assert!(report.input_connected);
        assert_eq!(report.outputs_connected, 1);
        assert_eq!(report.attempts, 2);
        assert_eq!(
            server.connect_attempts(),
            vec![
                ("system:capture_1".to_string(), "bridge:input".to_string()),
                ("bridge:output_1".to_string(), "system:playback_1".to_string()),
            ]
        );
    }

    #[test]
    fn never_more_output_connections_than_channels() {
        let server = SimulatedServer::new(64, 48000);
        for i in 1..=6 {
            server.add_physical_port(&format!("system:playback_{}", i), PortDirection::Input);
        }
        let mut client = open(&server);
        let ports = bridge_ports(client.as_mut(), 2);

        let report = auto_connect(client.as_mut(), &ports);

        assert!(!report.input_connected);
        assert_eq!(report.outputs_connected, 2);
        assert_eq!(server.connect_attempts().len(), 2);
        assert_eq!(
            server.connections(),
            vec![
                ("bridge:output_1".to_string(), "system:playback_1".to_string()),
                ("bridge:output_2".to_string(), "system:playback_2".to_string()),
            ]
        );
    }

    #[test]
    fn failed_connections_are_logged_and_the_scan_continues() {
        let _ = env_logger::builder().is_test(true).try_init();
        let server = SimulatedServer::new(64, 48000);
        server.add_physical_port("system:capture_1", PortDirection::Output);
        server.add_physical_port("system:capture_2", PortDirection::Output);
        server.add_physical_port("system:playback_1", PortDirection::Input);
        server.add_physical_port("system:playback_2", PortDirection::Input);
        server.fail_connections_to("system:playback_1");
        server.fail_connections_from("system:capture_1");
        let mut client = open(&server);
        let ports = bridge_ports(client.as_mut(), 1);

        let report = auto_connect(client.as_mut(), &ports);

        assert!(report.input_connected);
        assert_eq!(report.outputs_connected, 1);
        assert_eq!(report.attempts, 4);
        assert_eq!(
            server.connections(),
            vec![
                ("system:capture_2".to_string(), "bridge:input".to_string()),
                ("bridge:output_1".to_string(), "system:playback_2".to_string()),
            ]
        );
    }

    #[test]
    fn unresolvable_entries_are_skipped() {
        let server = SimulatedServer::new(64, 48000);
        server.add_physical_port("system:playback_1", PortDirection::Input);
        server.add_physical_port("system:playback_2", PortDirection::Input);
        server.hide_port_from_lookup("system:playback_1");
        let mut client = open(&server);
        let ports = bridge_ports(client.as_mut(), 1);

        let report = auto_connect(client.as_mut(), &ports);

        assert_eq!(report.skipped, 1);
        assert_eq!(
            server.connections(),
            vec![("bridge:output_1".to_string(), "system:playback_2".to_string())]
        );
    }

    #[test]
    fn scan_is_capped() {
        let server = SimulatedServer::new(64, 48000);
        for i in 0..(MAX_AUTO_CONNECT_ENTRIES + 10) {
            server.add_physical_port(&format!("system:playback_{}", i), PortDirection::Input);
            server.hide_port_from_lookup(&format!("system:playback_{}", i));
        }
        let mut client = open(&server);
        let ports = bridge_ports(client.as_mut(), 1);

        let report = auto_connect(client.as_mut(), &ports);

        assert_eq!(report.skipped, MAX_AUTO_CONNECT_ENTRIES);
        assert_eq!(report.attempts, 0);
    }
}
