use crate::session::StreamConfig;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub degradation: DegradationConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    pub cors_origin: String,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub audio_dir: String,
    pub metadata_dir: String,
    /// 0 disables periodic rescans
    pub rescan_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct DegradationConfig {
    pub segment_duration: f64,
    pub decay_rate: f64,
    pub lock_timeout_ms: u64,
}

impl DegradationConfig {
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            decay_rate: self.decay_rate,
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
        }
    }
}

impl Config {
    /// Defaults, then the optional file at `path`, then `EPHEMERAL__*` env vars
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "ephemeral-audio")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 5000)?
            .set_default("service.cors_origin", "*")?
            .set_default("storage.audio_dir", "./audio")?
            .set_default("storage.metadata_dir", "./metadata")?
            .set_default("storage.rescan_interval_secs", 60)?
            .set_default("degradation.segment_duration", 0.5)?
            .set_default("degradation.decay_rate", 1.0)?
            .set_default("degradation.lock_timeout_ms", 5000)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("EPHEMERAL")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        if !(cfg.degradation.segment_duration > 0.0) {
            anyhow::bail!(
                "degradation.segment_duration must be positive, got {}",
                cfg.degradation.segment_duration
            );
        }
        Ok(cfg)
    }
}
