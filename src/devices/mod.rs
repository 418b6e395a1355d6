// devices/mod.rs
mod hue_light;
mod smart_speaker;
mod smart_toilet;
#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;
use validator::Validate;

use crate::error::{CommandError, ConnectionError, IotError};
use crate::models::{DeviceStatus, MessageType};

pub use hue_light::HueLight;
pub use smart_speaker::SmartSpeaker;
pub use smart_toilet::SmartToilet;

/// Capability contract every registered device satisfies.
#[async_trait]
pub trait Device: Send + Sync {
    fn kind(&self) -> &'static str;
    async fn connect(&self) -> Result<(), ConnectionError>;
    async fn disconnect(&self) -> Result<(), ConnectionError>;
    async fn send_command(
        &self,
        command: MessageType,
        payload: Option<&str>,
    ) -> Result<(), CommandError>;
    async fn status(&self) -> DeviceStatus;
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeviceSettings {
    #[validate(length(min = 1))]
    pub kind: String,
    #[serde(default = "default_latency_ms")]
    #[validate(range(max = 60_000))]
    pub latency_ms: u64,
}

fn default_latency_ms() -> u64 {
    500
}

impl DeviceSettings {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Constructor for one device kind, collected at link time.
pub struct DeviceFactory {
    pub kind: &'static str,
    pub build: fn(&DeviceSettings) -> Box<dyn Device>,
}

inventory::collect!(DeviceFactory);

pub fn build(settings: &DeviceSettings) -> Result<Box<dyn Device>, IotError> {
    inventory::iter::<DeviceFactory>
        .into_iter()
        .find(|factory| factory.kind == settings.kind)
        .map(|factory| (factory.build)(settings))
        .ok_or_else(|| IotError::UnknownKind(settings.kind.clone()))
}

pub fn kinds() -> Vec<&'static str> {
    let mut kinds: Vec<_> = inventory::iter::<DeviceFactory>
        .into_iter()
        .map(|factory| factory.kind)
        .collect();
    kinds.sort_unstable();
    kinds
}

/// Simulated link handshake shared by the built-in devices.
async fn set_link(
    kind: &'static str,
    connected: &RwLock<bool>,
    online: bool,
    latency: Duration,
) -> Result<(), ConnectionError> {
    let mut link = connected.write().await;
    if *link == online {
        let reason = if online { "already connected" } else { "not connected" };
        return Err(ConnectionError::new(kind, reason));
    }
    tokio::time::sleep(latency).await;
    *link = online;
    info!(kind, online, "Link state changed");
    Ok(())
}

async fn ensure_connected(kind: &'static str, connected: &RwLock<bool>) -> Result<(), CommandError> {
    if *connected.read().await {
        Ok(())
    } else {
        Err(CommandError::InvalidState {
            kind: kind.to_string(),
            reason: "device is offline".to_string(),
        })
    }
}

fn build_hue_light(settings: &DeviceSettings) -> Box<dyn Device> {
    Box::new(HueLight::new(settings.latency()))
}

fn build_smart_speaker(settings: &DeviceSettings) -> Box<dyn Device> {
    Box::new(SmartSpeaker::new(settings.latency()))
}

fn build_smart_toilet(settings: &DeviceSettings) -> Box<dyn Device> {
    Box::new(SmartToilet::new(settings.latency()))
}

inventory::submit! {
    DeviceFactory { kind: HueLight::KIND, build: build_hue_light }
}

inventory::submit! {
    DeviceFactory { kind: SmartSpeaker::KIND, build: build_smart_speaker }
}

inventory::submit! {
    DeviceFactory { kind: SmartToilet::KIND, build: build_smart_toilet }
}
