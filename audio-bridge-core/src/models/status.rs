use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Status bits reported by the host when a client connection is opened.
    ///
    /// Several bits can be set at once. `SERVER_STARTED` is informational.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HostStatus: u32 {
        const FAILURE = 0x01;
        const INVALID_OPTION = 0x02;
        const NAME_NOT_UNIQUE = 0x04;
        const SERVER_STARTED = 0x08;
        const SERVER_FAILED = 0x10;
        const SERVER_ERROR = 0x20;
        const NO_SUCH_CLIENT = 0x40;
        const LOAD_FAILURE = 0x80;
        const INIT_FAILURE = 0x100;
        const SHM_FAILURE = 0x200;
        const VERSION_ERROR = 0x400;
        const BACKEND_ERROR = 0x800;
        const CLIENT_ZOMBIE = 0x1000;
    }
}

const DESCRIPTIONS: [(HostStatus, &str); 13] = [
    (HostStatus::FAILURE, "overall operation failed"),
    (
        HostStatus::INVALID_OPTION,
        "the operation contained an invalid or unsupported option",
    ),
    (HostStatus::NAME_NOT_UNIQUE, "the desired client name is not unique"),
    (
        HostStatus::SERVER_STARTED,
        "the server was started as a result of this operation",
    ),
    (HostStatus::SERVER_FAILED, "unable to connect to the server"),
    (HostStatus::SERVER_ERROR, "communication error with the server"),
    (HostStatus::NO_SUCH_CLIENT, "requested client does not exist"),
    (HostStatus::LOAD_FAILURE, "unable to load initial client"),
    (HostStatus::INIT_FAILURE, "unable to initialize client"),
    (HostStatus::SHM_FAILURE, "unable to access shared memory"),
    (
        HostStatus::VERSION_ERROR,
        "client's protocol version does not match",
    ),
    (HostStatus::BACKEND_ERROR, "a backend error occurred"),
    (HostStatus::CLIENT_ZOMBIE, "client zombified"),
];

impl HostStatus {
    /// One human-readable line per set flag, in flag order.
    pub fn descriptions(&self) -> Vec<&'static str> {
        DESCRIPTIONS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, text)| *text)
            .collect()
    }

    /// Whether any flag other than the informational `SERVER_STARTED` is set.
    pub fn is_failure(&self) -> bool {
        !self.difference(HostStatus::SERVER_STARTED).is_empty()
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self.descriptions();
        if lines.is_empty() {
            return write!(f, "no status flags set");
        }
        write!(f, "{}", lines.join("; "))
    }
}
