use crate::models::port::{PortId, MAX_OUTPUT_PORTS};

/// The bridge's registered ports: one input plus up to `MAX_OUTPUT_PORTS` outputs.
///
/// Backed by a fixed array, so resizing never allocates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortSet {
    input: Option<PortId>,
    outputs: [Option<PortId>; MAX_OUTPUT_PORTS],
    len: usize,
}

impl PortSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> Option<PortId> {
        self.input
    }

    pub fn set_input(&mut self, port: PortId) {
        self.input = Some(port);
    }

    pub fn take_input(&mut self) -> Option<PortId> {
        self.input.take()
    }

    /// Append an output port. Returns `false` when already at capacity.
    pub fn push_output(&mut self, port: PortId) -> bool {
        if self.len == MAX_OUTPUT_PORTS {
            return false;
        }
        self.outputs[self.len] = Some(port);
        self.len += 1;
        true
    }

    /// Registered output ports, in channel order.
    ///
    /// Every slot below `len` is populated, so this never contains gaps.
    pub fn outputs(&self) -> impl Iterator<Item = PortId> + '_ {
        self.outputs[..self.len].iter().flatten().copied()
    }

    /// Copy the output handles into `dest`, returning how many were written.
    pub fn copy_outputs(&self, dest: &mut [PortId; MAX_OUTPUT_PORTS]) -> usize {
        for (slot, port) in dest.iter_mut().zip(self.outputs()) {
            *slot = port;
        }
        self.len
    }

    pub fn output(&self, channel: usize) -> Option<PortId> {
        self.outputs.get(channel).copied().flatten()
    }

    pub fn output_count(&self) -> usize {
        self.len
    }

    /// Remove every output port, returning the handles in channel order.
    pub fn take_outputs(&mut self) -> impl Iterator<Item = PortId> {
        let taken = std::mem::replace(&mut self.outputs, [None; MAX_OUTPUT_PORTS]);
        self.len = 0;
        taken.into_iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_until_full() {
        let mut ports = PortSet::new();
        for i in 0..MAX_OUTPUT_PORTS {
            assert!(ports.push_output(PortId(i as u64)));
        }

        assert!(!ports.push_output(PortId(99)));
        assert_eq!(ports.output_count(), MAX_OUTPUT_PORTS);
        assert_eq!(ports.output(0), Some(PortId(0)));
        assert_eq!(ports.output(MAX_OUTPUT_PORTS), None);
    }

    #[test]
    fn take_outputs_preserves_order_and_empties() {
        let mut ports = PortSet::new();
        ports.set_input(PortId(100));
        ports.push_output(PortId(1));
        ports.push_output(PortId(2));

        let taken: Vec<PortId> = ports.take_outputs().collect();

        assert_eq!(taken, vec![PortId(1), PortId(2)]);
        assert_eq!(ports.output_count(), 0);
        assert_eq!(ports.outputs().count(), 0);
        assert_eq!(ports.input(), Some(PortId(100)));
    }

    #[test]
    fn copy_outputs_fills_prefix() {
        let mut ports = PortSet::new();
        ports.push_output(PortId(7));
        ports.push_output(PortId(8));

        let mut dest = [PortId(0); MAX_OUTPUT_PORTS];
        let count = ports.copy_outputs(&mut dest);

        assert_eq!(count, 2);
        assert_eq!(&dest[..count], &[PortId(7), PortId(8)]);
    }

    #[test]
    fn input_can_be_taken_once() {
        let mut ports = PortSet::new();
        ports.set_input(PortId(3));

        assert_eq!(ports.take_input(), Some(PortId(3)));
        assert_eq!(ports.take_input(), None);
    }
}
