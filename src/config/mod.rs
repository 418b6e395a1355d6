// config/mod.rs
use config::Config;
use serde::Deserialize;
use validator::Validate;

use crate::devices::DeviceSettings;

pub const DEFAULT_MAX_ID_ATTEMPTS: u32 = 16;

#[derive(Debug, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub service: ServiceSettings,
    pub logging: LoggingSettings,
    pub metrics: MetricsSettings,
    #[serde(default)]
    #[validate(nested)]
    pub devices: Vec<DeviceSettings>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServiceSettings {
    #[validate(range(min = 1, max = 1000))]
    pub max_id_attempts: u32,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
            },
            metrics: MetricsSettings {
                enabled: false,
                port: 9000,
            },
            devices: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("Invalid settings: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

impl Settings {
    pub fn new() -> Result<Self, SettingsError> {
        Self::from_builder(
            Config::builder()
                .add_source(config::File::with_name("config/config").required(false))
                .add_source(environment()),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, SettingsError> {
        let settings: Settings = builder
            .set_default(
                "service.max_id_attempts",
                i64::from(DEFAULT_MAX_ID_ATTEMPTS),
            )?
            .set_default("logging.level", "info")?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.port", 9000)?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }
}

/// `IOT_SECTION__KEY` variables, e.g. `IOT_METRICS__ENABLED=true`.
fn environment() -> config::Environment {
    config::Environment::with_prefix("IOT")
        .prefix_separator("_")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(toml: &str) -> Result<Settings, SettingsError> {
        Settings::from_builder(
            Config::builder().add_source(config::File::from_str(toml, config::FileFormat::Toml)),
        )
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let settings = load("").unwrap();
        assert_eq!(settings.service.max_id_attempts, DEFAULT_MAX_ID_ATTEMPTS);
        assert_eq!(settings.logging.level, "info");
        assert!(!settings.metrics.enabled);
        assert!(settings.devices.is_empty());
    }

    #[test]
    fn devices_are_read_from_file() {
        let settings = load(
            r#"
            [[devices]]
            kind = "hue_light"
            latency_ms = 10

            [[devices]]
            kind = "smart_toilet"
            "#,
        )
        .unwrap();

        assert_eq!(settings.devices.len(), 2);
        assert_eq!(settings.devices[0].kind, "hue_light");
        assert_eq!(settings.devices[0].latency_ms, 10);
        assert_eq!(settings.devices[1].latency_ms, 500);
    }

    #[test]
    fn environment_overrides_file() {
        let vars = [
            ("IOT_SERVICE__MAX_ID_ATTEMPTS", "5"),
            ("IOT_LOGGING__LEVEL", "debug"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let settings = Settings::from_builder(
            Config::builder()
                .add_source(config::File::from_str(
                    "[service]\nmax_id_attempts = 32",
                    config::FileFormat::Toml,
                ))
                .add_source(environment().source(Some(vars))),
        )
        .unwrap();

        assert_eq!(settings.service.max_id_attempts, 5);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn zero_attempt_budget_is_rejected() {
        let err = load("[service]\nmax_id_attempts = 0").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }
}
