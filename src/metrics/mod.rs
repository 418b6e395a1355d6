// metrics/mod.rs
use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

pub const DEVICES_REGISTERED: &str = "iot_devices_registered_total";
pub const DEVICES_UNREGISTERED: &str = "iot_devices_unregistered_total";
pub const DEVICES_ACTIVE: &str = "iot_devices_active";
pub const DISPATCHES: &str = "iot_dispatches_total";
pub const DISPATCH_DURATION: &str = "iot_dispatch_duration_seconds";

/// Installs the Prometheus exporter. Must be called from within a tokio runtime.
pub fn setup_metrics(port: u16) -> Result<(), BuildError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe();
    Ok(())
}

fn describe() {
    describe_counter!(DEVICES_REGISTERED, "Devices successfully registered");
    describe_counter!(DEVICES_UNREGISTERED, "Devices removed from the registry");
    describe_gauge!(DEVICES_ACTIVE, "Devices currently registered");
    describe_counter!(DISPATCHES, "Messages dispatched, labelled by outcome");
    describe_histogram!(
        DISPATCH_DURATION,
        Unit::Seconds,
        "Time spent inside a device command"
    );
}
