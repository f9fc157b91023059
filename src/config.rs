use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::handler::HandlerModel;

/// Server configuration.
///
/// Loaded from a YAML file named by `HEARTH_CONFIG`, with a `LISTEN`
/// environment override for the bind address. Every field has a default so
/// a partial file (or none at all) works.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backlog: u32,
    pub idle_timeout_ms: u64,
    pub max_lifetime_ms: u64,
    pub max_request_size_bytes: usize,
    pub handler_model: HandlerModel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            backlog: 128,
            idle_timeout_ms: 30_000,
            max_lifetime_ms: 300_000,
            max_request_size_bytes: 1024 * 1024,
            handler_model: HandlerModel::Inline,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("HEARTH_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("parsing config file {path}"))?
            }
            Err(_) => Config::default(),
        };

        if let Ok(listen) = std::env::var("LISTEN") {
            let (host, port) = listen
                .rsplit_once(':')
                .context("LISTEN must be host:port")?;
            cfg.host = host.to_string();
            cfg.port = port.parse().context("LISTEN port must be a number")?;
        }

        Ok(cfg)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_millis(self.max_lifetime_ms)
    }
}
