// error.rs
use std::fmt;

use thiserror::Error;

use crate::models::{DeviceId, MessageType};

/// A device could not be brought online or released cleanly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} connection error: {reason}")]
pub struct ConnectionError {
    pub kind: String,
    pub reason: String,
}

impl ConnectionError {
    pub fn new(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

/// A device rejected or failed a single command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("{kind} does not support {command}")]
    Unsupported { kind: String, command: MessageType },
    #[error("{command} requires a payload")]
    MissingPayload { command: MessageType },
    #[error("Invalid payload for {command}: {reason}")]
    InvalidPayload { command: MessageType, reason: String },
    #[error("{kind} cannot accept command: {reason}")]
    InvalidState { kind: String, reason: String },
    #[error("Device fault: {0}")]
    Fault(String),
}

#[derive(Error, Debug)]
pub enum IotError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("Unknown device: {0}")]
    UnknownDevice(DeviceId),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("Registration failed: no free identifier after {attempts} attempts")]
    Registration { attempts: u32 },
    #[error("Unknown device kind: {0}")]
    UnknownKind(String),
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Every failure collected from a batch once all of its operations finished.
#[derive(Error, Debug)]
pub struct BatchError {
    pub attempted: usize,
    pub failures: Vec<IotError>,
}

impl BatchError {
    pub fn new(attempted: usize, failures: Vec<IotError>) -> Self {
        Self {
            attempted,
            failures,
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} operations failed",
            self.failures.len(),
            self.attempted
        )?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }
        Ok(())
    }
}
