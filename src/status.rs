use std::fmt;

use nix::sys::wait::WaitStatus;

/// How a finished process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationResult {
    Exited(i32),
    Signaled(i32),
}

impl TerminationResult {
    /// Converts a wait status into a termination result.
    ///
    /// Returns `None` for statuses that don't mean the process is gone
    /// (stopped, continued, still alive).
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(TerminationResult::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(TerminationResult::Signaled(signal as i32)),
            _ => None,
        }
    }
}

impl fmt::Display for TerminationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationResult::Exited(code) => write!(f, "exit value {code}"),
            TerminationResult::Signaled(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}

/// Result of the most recent foreground command.
#[derive(Debug)]
pub struct StatusRegister {
    last: TerminationResult,
}

impl StatusRegister {
    pub fn new() -> Self {
        StatusRegister {
            last: TerminationResult::Exited(0),
        }
    }

    pub fn record(&mut self, result: TerminationResult) {
        self.last = result;
    }

    pub fn current(&self) -> TerminationResult {
        self.last
    }
}
