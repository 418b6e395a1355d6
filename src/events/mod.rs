// events/mod.rs
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::models::{DeviceId, MessageType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Registered,
    Unregistered,
    Dispatched,
    DispatchFailed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceEvent {
    Registered {
        device_id: DeviceId,
        kind: String,
        at: DateTime<Utc>,
    },
    Unregistered {
        device_id: DeviceId,
        kind: String,
        at: DateTime<Utc>,
    },
    Dispatched {
        device_id: DeviceId,
        command: MessageType,
        at: DateTime<Utc>,
    },
    DispatchFailed {
        device_id: DeviceId,
        command: MessageType,
        error: String,
        at: DateTime<Utc>,
    },
}

impl ServiceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ServiceEvent::Registered { .. } => EventKind::Registered,
            ServiceEvent::Unregistered { .. } => EventKind::Unregistered,
            ServiceEvent::Dispatched { .. } => EventKind::Dispatched,
            ServiceEvent::DispatchFailed { .. } => EventKind::DispatchFailed,
        }
    }
}

type Callback = Box<dyn Fn(&ServiceEvent) + Send + Sync>;

/// Synchronous fan-out of service lifecycle events.
///
/// Callbacks run on the publishing task while the subscriber list is read-locked,
/// so a callback must not subscribe to the same bus.
#[derive(Default)]
pub struct EventBus {
    subscribers: DashMap<EventKind, Vec<Callback>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    pub fn publish(&self, event: &ServiceEvent) {
        if let Some(subscribers) = self.subscribers.get(&event.kind()) {
            for callback in subscribers.iter() {
                (callback)(event);
            }
        }
    }

    pub fn subscribe<F: Fn(&ServiceEvent) + Send + Sync + 'static>(
        &self,
        kind: EventKind,
        callback: F,
    ) {
        self.subscribers
            .entry(kind)
            .or_default()
            .push(Box::new(callback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[test]
    fn only_matching_subscribers_are_called() {
        let bus = EventBus::new();
        let registered = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&registered);
        bus.subscribe(EventKind::Registered, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&failed);
        bus.subscribe(EventKind::DispatchFailed, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&ServiceEvent::Registered {
            device_id: DeviceId::from("ABCDEFGH"),
            kind: "hue_light".to_string(),
            at: Utc::now(),
        });

        assert_eq!(registered.load(Ordering::SeqCst), 1);
        assert_eq!(failed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = ServiceEvent::Dispatched {
            device_id: DeviceId::from("ABCDEFGH"),
            command: MessageType::SwitchOn,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "dispatched");
        assert_eq!(json["command"], "SWITCH_ON");
        assert_eq!(json["device_id"], "ABCDEFGH");
    }
}
