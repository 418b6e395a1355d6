// main.rs
use std::collections::HashMap;

use futures_util::future::join_all;
use iot_orchestrator::{
    DeviceId, IotService, Message, MessageType, Routine,
    config::Settings,
    devices::{self, HueLight, SmartSpeaker, SmartToilet},
    events::EventKind,
};
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::new()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .init();

    if settings.metrics.enabled {
        iot_orchestrator::metrics::setup_metrics(settings.metrics.port)
            .map_err(|e| anyhow::anyhow!("Failed to setup metrics: {}", e))?;
        tracing::info!("Metrics exporter listening on port {}", settings.metrics.port);
    }

    let service = IotService::new(&settings.service);
    for kind in [EventKind::Registered, EventKind::Unregistered, EventKind::DispatchFailed] {
        service.events().subscribe(kind, |event| {
            if let Ok(json) = serde_json::to_string(event) {
                tracing::debug!(event = %json, "Service event");
            }
        });
    }

    let start = Instant::now();

    let built = settings
        .devices
        .iter()
        .map(devices::build)
        .collect::<Result<Vec<_>, _>>()?;
    let registrations = built.into_iter().map(|device| {
        let kind = device.kind();
        let service = &service;
        async move { service.register(device).await.map(|id| (kind, id)) }
    });
    let ids: HashMap<&'static str, DeviceId> = join_all(registrations)
        .await
        .into_iter()
        .collect::<Result<_, _>>()?;
    tracing::info!("Registered {} devices", service.len());

    let result = match (
        ids.get(HueLight::KIND),
        ids.get(SmartSpeaker::KIND),
        ids.get(SmartToilet::KIND),
    ) {
        (Some(light), Some(speaker), Some(toilet)) => {
            wake_up(light, speaker, toilet).execute(&service).await
        }
        _ => {
            tracing::warn!(
                "Wake-up routine needs {}, {} and {}; skipping",
                HueLight::KIND,
                SmartSpeaker::KIND,
                SmartToilet::KIND
            );
            Ok(())
        }
    };
    if let Err(e) = &result {
        tracing::error!("Routine failed: {}", e);
    }

    service
        .shutdown()
        .await
        .map_err(|e| anyhow::anyhow!("Shutdown error: {}", e))?;

    tracing::info!("Elapsed: {:.3}s", start.elapsed().as_secs_f64());
    result.map_err(Into::into)
}

fn wake_up(light: &DeviceId, speaker: &DeviceId, toilet: &DeviceId) -> Routine {
    Routine::sequence([
        Routine::parallel([
            Routine::send(Message::new(light.clone(), MessageType::SwitchOn)),
            Routine::send(Message::new(speaker.clone(), MessageType::SwitchOn)),
        ]),
        Routine::send(Message::with_data(
            speaker.clone(),
            MessageType::PlaySong,
            "Rick Astley - Never Gonna Give You Up",
        )),
        Routine::parallel([
            Routine::send(Message::new(light.clone(), MessageType::SwitchOff)),
            Routine::send(Message::new(speaker.clone(), MessageType::SwitchOff)),
        ]),
        Routine::sequence([
            Routine::send(Message::new(toilet.clone(), MessageType::Flush)),
            Routine::send(Message::new(toilet.clone(), MessageType::Clean)),
        ]),
    ])
}
