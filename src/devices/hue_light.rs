// hue_light.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    error::{CommandError, ConnectionError},
    models::{DeviceStatus, MessageType},
};

struct LightState {
    power: bool,
    color: [u8; 3],
    updated_at: DateTime<Utc>,
}

pub struct HueLight {
    latency: Duration,
    connected: RwLock<bool>,
    state: RwLock<LightState>,
}

impl HueLight {
    pub const KIND: &'static str = "hue_light";

    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            connected: RwLock::new(false),
            state: RwLock::new(LightState {
                power: false,
                color: [255, 255, 255],
                updated_at: Utc::now(),
            }),
        }
    }

    pub async fn color(&self) -> [u8; 3] {
        self.state.read().await.color
    }
}

fn parse_color(hex: &str) -> Result<[u8; 3], CommandError> {
    let invalid = |reason: &str| CommandError::InvalidPayload {
        command: MessageType::ChangeColor,
        reason: reason.to_string(),
    };

    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| invalid("expected #RRGGBB"))?;
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid("expected #RRGGBB"));
    }

    let mut color = [0u8; 3];
    for (i, channel) in color.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| invalid("not a hex color"))?;
    }
    Ok(color)
}

#[async_trait]
impl super::Device for HueLight {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    async fn connect(&self) -> Result<(), ConnectionError> {
        super::set_link(Self::KIND, &self.connected, true, self.latency).await
    }

    async fn disconnect(&self) -> Result<(), ConnectionError> {
        super::set_link(Self::KIND, &self.connected, false, self.latency).await
    }

    async fn send_command(
        &self,
        command: MessageType,
        payload: Option<&str>,
    ) -> Result<(), CommandError> {
        super::ensure_connected(Self::KIND, &self.connected).await?;

        let color = match command {
            MessageType::SwitchOn | MessageType::SwitchOff => None,
            MessageType::ChangeColor => {
                let hex = payload.ok_or(CommandError::MissingPayload { command })?;
                Some(parse_color(hex)?)
            }
            _ => {
                return Err(CommandError::Unsupported {
                    kind: Self::KIND.to_string(),
                    command,
                })
            }
        };

        tokio::time::sleep(self.latency).await;

        let mut state = self.state.write().await;
        match command {
            MessageType::SwitchOn => state.power = true,
            MessageType::SwitchOff => state.power = false,
            _ => {}
        }
        if let Some(color) = color {
            state.color = color;
        }
        state.updated_at = Utc::now();
        info!(%command, power = state.power, "Hue light handled command");
        Ok(())
    }

    async fn status(&self) -> DeviceStatus {
        let state = self.state.read().await;
        let [r, g, b] = state.color;
        DeviceStatus {
            kind: Self::KIND.to_string(),
            connected: *self.connected.read().await,
            power: state.power,
            detail: Some(format!("#{r:02X}{g:02X}{b:02X}")),
            updated_at: state.updated_at,
        }
    }
}
