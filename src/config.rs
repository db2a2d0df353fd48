use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub artifact_dir: PathBuf,
    pub bind_addr: String,
    pub port: u16,
    pub osrm_url: String,
    pub osrm_timeout_secs: u64,
    pub session_idle_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("artifacts"),
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            osrm_url: "http://router.project-osrm.org".to_string(),
            osrm_timeout_secs: 10,
            session_idle_secs: 30 * 60,
        }
    }
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path).with_context(|| format!("config file {} not found", path))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path))
    }

    /// `FARE_CONFIG` file first (if set), then individual env vars on top.
    pub fn from_env() -> Result<Self> {
        let base = match std::env::var("FARE_CONFIG") {
            Ok(path) => Self::load(&path)?,
            Err(_) => Self::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = var("ARTIFACT_DIR") {
            self.artifact_dir = PathBuf::from(dir);
        }
        if let Some(addr) = var("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(port) = var("PORT").and_then(|s| s.parse().ok()) {
            self.port = port;
        }
        if let Some(url) = var("OSRM_URL") {
            self.osrm_url = url;
        }
        if let Some(secs) = var("OSRM_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.osrm_timeout_secs = secs;
        }
        if let Some(secs) = var("SESSION_IDLE_SECS").and_then(|s| s.parse().ok()) {
            self.session_idle_secs = secs;
        }
        self
    }

    pub fn osrm_timeout(&self) -> Duration {
        Duration::from_secs(self.osrm_timeout_secs)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.bind_addr, self.port))
    }
}
