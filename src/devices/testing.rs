// devices/testing.rs
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    error::{CommandError, ConnectionError},
    models::{DeviceStatus, MessageType},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Disconnect,
    Command(MessageType, Option<String>),
}

/// Scriptable device that records every call it receives.
pub struct ProbeDevice {
    label: String,
    latency: Duration,
    fail_connect: bool,
    fail_disconnect: bool,
    failing: HashSet<MessageType>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl ProbeDevice {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            latency: Duration::ZERO,
            fail_connect: false,
            fail_disconnect: false,
            failing: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn fail_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn fail_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    pub fn fail_on(mut self, command: MessageType) -> Self {
        self.failing.insert(command);
        self
    }

    /// Shared call log that stays readable after the device is moved into a service.
    pub fn calls(&self) -> Arc<Mutex<Vec<Call>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn commands(calls: &Mutex<Vec<Call>>) -> Vec<MessageType> {
    calls
        .lock()
        .unwrap()
        .iter()
        .filter_map(|call| match call {
            Call::Command(command, _) => Some(*command),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl super::Device for ProbeDevice {
    fn kind(&self) -> &'static str {
        "probe"
    }

    async fn connect(&self) -> Result<(), ConnectionError> {
        tokio::time::sleep(self.latency).await;
        self.record(Call::Connect);
        if self.fail_connect {
            return Err(ConnectionError::new("probe", format!("{} unreachable", self.label)));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ConnectionError> {
        tokio::time::sleep(self.latency).await;
        self.record(Call::Disconnect);
        if self.fail_disconnect {
            return Err(ConnectionError::new("probe", format!("{} stuck", self.label)));
        }
        Ok(())
    }

    async fn send_command(
        &self,
        command: MessageType,
        payload: Option<&str>,
    ) -> Result<(), CommandError> {
        tokio::time::sleep(self.latency).await;
        self.record(Call::Command(command, payload.map(str::to_string)));
        if self.failing.contains(&command) {
            return Err(CommandError::Fault(format!("{} failed {command}", self.label)));
        }
        Ok(())
    }

    async fn status(&self) -> DeviceStatus {
        DeviceStatus {
            kind: "probe".to_string(),
            connected: true,
            power: false,
            detail: Some(self.label.clone()),
            updated_at: Utc::now(),
        }
    }
}
