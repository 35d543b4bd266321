use super::log::{Alert, AlertTicket, LogEntry};
use super::state::Actuator;

/// Payloads carried by the kernel event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timer {
    /// Periodic simulator step; reschedules itself.
    SimulatorTick,
    /// Automatic off-transition after a timed pump/mister run.
    Reversal { actuator: Actuator },
    AlertExpiry { ticket: AlertTicket },
}

/// Produced by the simulator and command handlers, applied by the reactor.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    Log(LogEntry),
    Alert(Alert),
}
