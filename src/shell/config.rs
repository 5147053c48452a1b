use crate::modules::offers::use_cases::relay_outbox::backoff::ExponentialBackoff;
use crate::modules::offers::use_cases::relay_outbox::relay::{RelayConfig, Shard};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Configuration that can be loaded from environment variables.
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn env_parse<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_or_default(key, default)
        .parse()
        .map_err(|err: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: err.to_string(),
        })
}

fn env_millis(key: &str, default: u64) -> Result<Duration, ConfigError> {
    env_parse::<u64>(key, &default.to_string()).map(Duration::from_millis)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulsarConfig {
    pub broker_url: String,
    pub tenant: String,
    pub namespace: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub jwt_secret: String,
    pub request_timeout: Duration,
    /// `None` keeps events in process memory.
    pub pulsar: Option<PulsarConfig>,
    pub relay: RelayConfig,
}

impl FromEnv for AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let pulsar = env::var("PULSAR_BROKER_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .map(|broker_url| PulsarConfig {
                broker_url,
                tenant: env_or_default("PULSAR_TENANT", "public"),
                namespace: env_or_default("PULSAR_NAMESPACE", "default"),
            });

        let shard_count: u64 = env_parse("RELAY_SHARD_COUNT", "1")?;
        let shard_index: u64 = env_parse("RELAY_SHARD_INDEX", "0")?;
        if shard_count == 0 || shard_index >= shard_count {
            return Err(ConfigError::ParseError {
                key: "RELAY_SHARD_INDEX".into(),
                details: format!("shard {shard_index} is outside 0..{shard_count}"),
            });
        }

        let relay = RelayConfig {
            topic: env_or_default("EVENT_TOPIC", "eventos_ofertas"),
            source_service: env_or_default("SOURCE_SERVICE", "servico-ofertas"),
            batch_size: env_parse("RELAY_BATCH_SIZE", "100")?,
            max_attempts: env_parse("RELAY_MAX_ATTEMPTS", "10")?,
            lease: env_millis("RELAY_LEASE_MS", 30_000)?,
            publish_timeout: env_millis("RELAY_PUBLISH_TIMEOUT_MS", 5_000)?,
            poll_interval: env_millis("RELAY_POLL_INTERVAL_MS", 500)?,
            backoff: ExponentialBackoff::new(
                env_millis("RELAY_BACKOFF_BASE_MS", 1_000)?,
                env_millis("RELAY_BACKOFF_CAP_MS", 60_000)?,
            ),
            shard: (shard_count > 1).then_some(Shard {
                index: shard_index,
                count: shard_count,
            }),
        };

        Ok(Self {
            http_addr: env_parse("HTTP_ADDR", "0.0.0.0:8080")?,
            jwt_secret: env_required("AUTH_JWT_SECRET")?,
            request_timeout: env_millis("REQUEST_TIMEOUT_MS", 5_000)?,
            pulsar,
            relay,
        })
    }
}
