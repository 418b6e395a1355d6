// smart_speaker.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    error::{CommandError, ConnectionError},
    models::{DeviceStatus, MessageType},
};

struct SpeakerState {
    power: bool,
    now_playing: Option<String>,
    updated_at: DateTime<Utc>,
}

pub struct SmartSpeaker {
    latency: Duration,
    connected: RwLock<bool>,
    state: RwLock<SpeakerState>,
}

impl SmartSpeaker {
    pub const KIND: &'static str = "smart_speaker";

    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            connected: RwLock::new(false),
            state: RwLock::new(SpeakerState {
                power: false,
                now_playing: None,
                updated_at: Utc::now(),
            }),
        }
    }

    pub async fn now_playing(&self) -> Option<String> {
        self.state.read().await.now_playing.clone()
    }
}

#[async_trait]
impl super::Device for SmartSpeaker {
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

        match command {
            MessageType::SwitchOn | MessageType::SwitchOff => {}
            MessageType::PlaySong => {
                let song = payload.ok_or(CommandError::MissingPayload { command })?;
                if song.trim().is_empty() {
                    return Err(CommandError::InvalidPayload {
                        command,
                        reason: "song title is empty".to_string(),
                    });
                }
                if !self.state.read().await.power {
                    return Err(CommandError::InvalidState {
                        kind: Self::KIND.to_string(),
                        reason: "speaker is switched off".to_string(),
                    });
                }
            }
            _ => {
                return Err(CommandError::Unsupported {
                    kind: Self::KIND.to_string(),
                    command,
                })
            }
        }

        tokio::time::sleep(self.latency).await;

        let mut state = self.state.write().await;
        match command {
            MessageType::SwitchOn => state.power = true,
            MessageType::SwitchOff => {
                state.power = false;
                state.now_playing = None;
            }
            MessageType::PlaySong => {
                let song = payload.map(str::to_string);
                info!(song = ?song, "Speaker playing");
                state.now_playing = song;
            }
            _ => {}
        }
        state.updated_at = Utc::now();
        Ok(())
    }

    async fn status(&self) -> DeviceStatus {
        let state = self.state.read().await;
        DeviceStatus {
            kind: Self::KIND.to_string(),
            connected: *self.connected.read().await,
            power: state.power,
            detail: state.now_playing.clone(),
            updated_at: state.updated_at,
        }
    }
}
