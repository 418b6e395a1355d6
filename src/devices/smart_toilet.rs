// smart_toilet.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    error::{CommandError, ConnectionError},
    models::{DeviceStatus, MessageType},
};

struct ToiletState {
    flushes: u32,
    cleans: u32,
    updated_at: DateTime<Utc>,
}

pub struct SmartToilet {
    latency: Duration,
    connected: RwLock<bool>,
    state: RwLock<ToiletState>,
}

impl SmartToilet {
    pub const KIND: &'static str = "smart_toilet";

    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            connected: RwLock::new(false),
            state: RwLock::new(ToiletState {
                flushes: 0,
                cleans: 0,
                updated_at: Utc::now(),
            }),
        }
    }

    pub async fn cycles(&self) -> (u32, u32) {
        let state = self.state.read().await;
        (state.flushes, state.cleans)
    }
}

#[async_trait]
impl super::Device for SmartToilet {
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
        _payload: Option<&str>,
    ) -> Result<(), CommandError> {
        super::ensure_connected(Self::KIND, &self.connected).await?;

        if !matches!(command, MessageType::Flush | MessageType::Clean) {
            return Err(CommandError::Unsupported {
                kind: Self::KIND.to_string(),
                command,
            });
        }

        tokio::time::sleep(self.latency).await;

        let mut state = self.state.write().await;
        if command == MessageType::Flush {
            state.flushes = state.flushes.saturating_add(1);
        } else {
            state.cleans = state.cleans.saturating_add(1);
        }
        state.updated_at = Utc::now();
        info!(%command, "Toilet cycle complete");
        Ok(())
    }

    async fn status(&self) -> DeviceStatus {
        let state = self.state.read().await;
        DeviceStatus {
            kind: Self::KIND.to_string(),
            connected: *self.connected.read().await,
            power: true,
            detail: Some(format!("{} flushes, {} cleans", state.flushes, state.cleans)),
            updated_at: state.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::Device;

    #[tokio::test]
    async fn counts_flush_and_clean_cycles() {
        let toilet = SmartToilet::new(Duration::ZERO);
        toilet.connect().await.unwrap();

        toilet.send_command(MessageType::Flush, None).await.unwrap();
        toilet.send_command(MessageType::Flush, None).await.unwrap();
        toilet.send_command(MessageType::Clean, None).await.unwrap();

        assert_eq!(toilet.cycles().await, (2, 1));
    }

    #[tokio::test]
    async fn cycle_counters_saturate() {
        let toilet = SmartToilet::new(Duration::ZERO);
        toilet.connect().await.unwrap();
        toilet.state.write().await.flushes = u32::MAX;

        toilet.send_command(MessageType::Flush, None).await.unwrap();

        assert_eq!(toilet.cycles().await, (u32::MAX, 0));
    }

    #[tokio::test]
    async fn switch_on_is_unsupported() {
        let toilet = SmartToilet::new(Duration::ZERO);
        toilet.connect().await.unwrap();

        let err = toilet
            .send_command(MessageType::SwitchOn, None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::Unsupported {
                kind: "smart_toilet".to_string(),
                command: MessageType::SwitchOn,
            }
        );
    }
}
