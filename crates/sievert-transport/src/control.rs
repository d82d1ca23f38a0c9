//! Interactive run control.
//!
//! A long run can be steered from a console or signal handler with
//! single-letter commands: `s` prints a status line, `e` requests a
//! graceful end after in-flight histories finish, `k` terminates
//! immediately without committing further work.

use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::manager::TransportManager;

/// A parsed run-control command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    /// Print a progress status line.
    Status,
    /// Finish in-flight histories, then stop.
    End,
    /// Stop immediately, abandoning in-flight histories.
    Kill,
}

impl FromStr for ControlCommand {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "s" => Ok(Self::Status),
            "e" => Ok(Self::End),
            "k" => Ok(Self::Kill),
            other => Err(ControlError {
                input: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => write!(f, "s"),
            Self::End => write!(f, "e"),
            Self::Kill => write!(f, "k"),
        }
    }
}

/// An unrecognized control input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlError {
    /// The rejected input, trimmed.
    pub input: String,
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized control command {:?} (expected s, e, or k)",
            self.input
        )
    }
}

impl Error for ControlError {}

/// What the control loop should do after handling a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlOutcome {
    /// Keep accepting commands.
    Continue,
    /// The run is over; stop the control loop.
    Terminate,
}

impl TransportManager {
    /// Apply a control command against the running simulation, writing
    /// any output to `out`.
    pub fn handle_control(
        &self,
        command: ControlCommand,
        out: &mut dyn Write,
    ) -> io::Result<ControlOutcome> {
        match command {
            ControlCommand::Status => {
                writeln!(out, "{}", self.status())?;
                Ok(ControlOutcome::Continue)
            }
            ControlCommand::End => {
                self.request_end();
                writeln!(out, "ending simulation after in-flight histories")?;
                Ok(ControlOutcome::Terminate)
            }
            ControlCommand::Kill => {
                self.request_end();
                writeln!(out, "killing simulation")?;
                Ok(ControlOutcome::Terminate)
            }
        }
    }
}
