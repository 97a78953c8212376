use std::fmt;

/// Lifecycle of a forwarder
///
/// `Created → Running → Stopping → Stopped`, never backwards. `Stopping`
/// starts with the first `stop` call or the first failed direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwarderState {
    Created,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for ForwarderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForwarderState::Created => "created",
            ForwarderState::Running => "running",
            ForwarderState::Stopping => "stopping",
            ForwarderState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// One of the two copy directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Reads from endpoint A, writes to endpoint B
    AToB,
    /// Reads from endpoint B, writes to endpoint A
    BToA,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::AToB, Direction::BToA];

    pub(crate) fn index(self) -> usize {
        match self {
            Direction::AToB => 0,
            Direction::BToA => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::AToB => f.write_str("A->B"),
            Direction::BToA => f.write_str("B->A"),
        }
    }
}
