use bitflags::bitflags;

/// Hard upper bound on the number of output ports the bridge registers.
pub const MAX_OUTPUT_PORTS: usize = 8;

/// Short name of the single input port.
pub const INPUT_PORT_NAME: &str = "input";

/// Opaque handle to a port registered with the host graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub u64);

/// Direction of a port, seen from the client that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// The client reads samples from this port.
    Input,
    /// The client writes samples to this port.
    Output,
}

impl PortDirection {
    pub fn flags(&self) -> PortFlags {
        match self {
            Self::Input => PortFlags::IS_INPUT,
            Self::Output => PortFlags::IS_OUTPUT,
        }
    }
}

bitflags! {
    /// Capability flags attached to every port in the host graph.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PortFlags: u32 {
        const IS_INPUT = 0x01;
        const IS_OUTPUT = 0x02;
        const IS_PHYSICAL = 0x04;
        const IS_TERMINAL = 0x10;
    }
}

/// A port as resolved by name from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub id: PortId,
    pub name: String,
    pub flags: PortFlags,
}

/// Name of the output port at `index` (0-based): `output_1`, `output_2`, ...
pub fn output_port_name(index: usize) -> String {
    format!("output_{}", index + 1)
}

/// Clamp a requested output channel count to `[1, MAX_OUTPUT_PORTS]`.
pub fn clamp_channel_count(requested: usize) -> usize {
    requested.clamp(1, MAX_OUTPUT_PORTS)
}
