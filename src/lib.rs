// lib.rs
pub mod config;
pub mod devices;
pub mod error;
pub mod events;
pub mod metrics;
pub mod models;
pub mod program;
pub mod service;
pub mod utils;

pub use devices::Device;
pub use error::{BatchError, CommandError, ConnectionError, IotError};
pub use models::{DeviceId, DeviceStatus, Message, MessageType, Program};
pub use program::{Routine, parallel, sequence};
pub use service::IotService;
