// service.rs
use std::sync::Arc;

use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use futures_util::future::join_all;
use tokio::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
    config::ServiceSettings,
    devices::Device,
    error::{BatchError, IotError},
    events::{EventBus, ServiceEvent},
    metrics as names,
    models::{DeviceId, Message, Program},
    utils,
};

pub type IdGenerator = Box<dyn Fn() -> DeviceId + Send + Sync>;

/// Registry of connected devices and dispatcher for their messages.
///
/// Every key in the registry belongs to a device whose `connect` succeeded
/// and whose `disconnect` has not been started through this service.
pub struct IotService {
    devices: DashMap<DeviceId, Arc<dyn Device>>,
    max_id_attempts: u32,
    generate_id: IdGenerator,
    events: EventBus,
}

impl Default for IotService {
    fn default() -> Self {
        Self::new(&ServiceSettings::default())
    }
}

impl IotService {
    pub fn new(settings: &ServiceSettings) -> Self {
        Self {
            devices: DashMap::new(),
            max_id_attempts: settings.max_id_attempts.max(1),
            generate_id: Box::new(utils::generate_id),
            events: EventBus::new(),
        }
    }

    /// Replaces the random identifier source.
    pub fn with_id_generator(mut self, generate_id: IdGenerator) -> Self {
        self.generate_id = generate_id;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn register(&self, device: Box<dyn Device>) -> Result<DeviceId, IotError> {
        let kind = device.kind();
        device.connect().await.inspect_err(|e| {
            error!(kind, error = %e, "Device failed to connect");
        })?;

        let device: Arc<dyn Device> = Arc::from(device);
        for _ in 0..self.max_id_attempts {
            let id = (self.generate_id)();
            match self.devices.entry(id.clone()) {
                Entry::Occupied(_) => {
                    warn!(%id, "Identifier collision, regenerating");
                }
                Entry::Vacant(slot) => {
                    slot.insert(device);
                    self.record_population();
                    metrics::counter!(names::DEVICES_REGISTERED, "kind" => kind).increment(1);
                    info!(%id, kind, "Device registered");
                    self.events.publish(&ServiceEvent::Registered {
                        device_id: id.clone(),
                        kind: kind.to_string(),
                        at: Utc::now(),
                    });
                    return Ok(id);
                }
            }
        }

        error!(kind, attempts = self.max_id_attempts, "No free identifier");
        if let Err(e) = device.disconnect().await {
            warn!(kind, error = %e, "Disconnect after failed registration also failed");
        }
        Err(IotError::Registration {
            attempts: self.max_id_attempts,
        })
    }

    /// Removes the device and disconnects it. The entry is gone even when
    /// `disconnect` fails; that error is returned afterwards.
    pub async fn unregister(&self, id: &DeviceId) -> Result<(), IotError> {
        let (id, device) = self
            .devices
            .remove(id)
            .ok_or_else(|| IotError::UnknownDevice(id.clone()))?;
        self.record_population();
        metrics::counter!(names::DEVICES_UNREGISTERED, "kind" => device.kind()).increment(1);

        let result = device.disconnect().await;
        match &result {
            Ok(()) => info!(%id, kind = device.kind(), "Device unregistered"),
            Err(e) => error!(
                %id,
                kind = device.kind(),
                error = %e,
                "Device unregistered, disconnect failed"
            ),
        }
        self.events.publish(&ServiceEvent::Unregistered {
            device_id: id,
            kind: device.kind().to_string(),
            at: Utc::now(),
        });
        result.map_err(IotError::from)
    }

    pub fn get(&self, id: &DeviceId) -> Result<Arc<dyn Device>, IotError> {
        self.devices
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| IotError::UnknownDevice(id.clone()))
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.devices.contains_key(id)
    }

    pub fn ids(&self) -> Vec<DeviceId> {
        self.devices.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub async fn dispatch(&self, msg: &Message) -> Result<(), IotError> {
        let device = self.get(msg.device_id())?;
        let command = msg.msg_type();

        let started = Instant::now();
        let result = device.send_command(command, msg.data()).await;
        metrics::histogram!(names::DISPATCH_DURATION).record(started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                metrics::counter!(names::DISPATCHES, "outcome" => "ok").increment(1);
                info!(id = %msg.device_id(), %command, "Message dispatched");
                self.events.publish(&ServiceEvent::Dispatched {
                    device_id: msg.device_id().clone(),
                    command,
                    at: Utc::now(),
                });
                Ok(())
            }
            Err(e) => {
                metrics::counter!(names::DISPATCHES, "outcome" => "error").increment(1);
                warn!(id = %msg.device_id(), %command, error = %e, "Device rejected message");
                self.events.publish(&ServiceEvent::DispatchFailed {
                    device_id: msg.device_id().clone(),
                    command,
                    error: e.to_string(),
                    at: Utc::now(),
                });
                Err(e.into())
            }
        }
    }

    /// Dispatches every message of the program concurrently. All messages are
    /// attempted; failures are reported together once the last one finishes.
    pub async fn run(&self, program: &Program) -> Result<(), IotError> {
        let span = info_span!("program", run_id = %Uuid::new_v4(), messages = program.len());
        async {
            info!("Running program");
            let results = join_all(program.messages().iter().map(|msg| self.dispatch(msg))).await;
            let failures: Vec<IotError> = results.into_iter().filter_map(Result::err).collect();

            if failures.is_empty() {
                info!("Program finished");
                Ok(())
            } else {
                warn!(failed = failures.len(), "Program finished with failures");
                Err(BatchError::new(program.len(), failures).into())
            }
        }
        .instrument(span)
        .await
    }

    /// Unregisters every device concurrently; all entries are removed even if
    /// some disconnects fail.
    pub async fn shutdown(&self) -> Result<(), IotError> {
        let ids = self.ids();
        let attempted = ids.len();
        let results = join_all(ids.iter().map(|id| self.unregister(id))).await;
        let failures: Vec<IotError> = results.into_iter().filter_map(Result::err).collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BatchError::new(attempted, failures).into())
        }
    }

    fn record_population(&self) {
        metrics::gauge!(names::DEVICES_ACTIVE).set(self.devices.len() as f64);
    }
}
