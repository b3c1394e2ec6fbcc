// Service configuration parsed from environment variables.

use crate::modules::aggregates::use_cases::project_events::runner::RunnerConfig;
use crate::modules::aggregates::use_cases::project_events::status::LagThresholds;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("PROJECTION_LAG_WARNING_SECS must not exceed PROJECTION_LAG_CRITICAL_SECS")]
    LagThresholdsInverted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub aggregate_types: Vec<String>,
    pub event_type_namespace: String,
    pub projector_batch_size: usize,
    pub runner: RunnerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let http_addr = parse(&lookup, "HTTP_ADDR", "0.0.0.0:8080")?;

        let aggregate_types: Vec<String> = lookup("AGGREGATE_TYPES")
            .unwrap_or_else(|| "vertreter".to_string())
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if aggregate_types.is_empty() {
            return Err(ConfigError::Empty("AGGREGATE_TYPES"));
        }

        let event_type_namespace =
            lookup("EVENT_TYPE_NAMESPACE").unwrap_or_else(|| "space.maatini.".to_string());

        let projector_batch_size: usize = parse(&lookup, "PROJECTOR_BATCH_SIZE", "50")?;
        if projector_batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "PROJECTOR_BATCH_SIZE",
                value: "0".to_string(),
            });
        }

        let poll_interval = millis(&lookup, "PROJECTOR_POLL_INTERVAL_MS", "500")?;
        let backoff_base = millis(&lookup, "PROJECTOR_BACKOFF_BASE_MS", "100")?;
        let backoff_max = millis(&lookup, "PROJECTOR_BACKOFF_MAX_MS", "10000")?;
        let lag = LagThresholds {
            warning: Duration::from_secs(parse(&lookup, "PROJECTION_LAG_WARNING_SECS", "30")?),
            critical: Duration::from_secs(parse(&lookup, "PROJECTION_LAG_CRITICAL_SECS", "300")?),
        };
        if lag.warning > lag.critical {
            return Err(ConfigError::LagThresholdsInverted);
        }

        Ok(AppConfig {
            http_addr,
            aggregate_types,
            event_type_namespace,
            projector_batch_size,
            runner: RunnerConfig {
                poll_interval,
                backoff_base,
                backoff_max: backoff_max.max(backoff_base),
                lag,
            },
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError> {
    let value = lookup(key).unwrap_or_else(|| default.to_string());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<Duration, ConfigError> {
    parse(lookup, key, default).map(Duration::from_millis)
}
