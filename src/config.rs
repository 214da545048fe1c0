//! Process configuration loaded once at startup from environment variables.
//!
//! Unlike [`async-openai`]'s `Config` trait — built so a single binary can
//! address multiple providers — this gateway has exactly one upstream, so
//! configuration is a plain struct rather than a trait object.

use std::net::SocketAddr;
use std::time::Duration;

/// Default base URL for the upstream engine.
pub const DEFAULT_VLLM_URL: &str = "http://vllm:8000";
/// Default timeout for a single engine HTTP call.
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 180;
/// Default directory for uploaded and generated batch artifacts.
pub const DEFAULT_BLOB_STORE_DIR: &str = "batch_files";
/// Default bind address for the HTTP surface.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream engine, e.g. `http://vllm:8000`.
    pub vllm_url: String,
    /// Shared bearer token. Empty disables auth.
    pub api_token: String,
    /// Per-call timeout when POSTing to the engine.
    pub engine_timeout: Duration,
    /// Directory backing the blob store (uploaded files + batch artifacts).
    pub blob_store_dir: String,
    /// Address the HTTP surface binds to.
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Loads configuration from the environment, reading a `.env` file first
    /// if present (mirrors `original_source/backend/utils/config.py`'s
    /// `load_dotenv()`).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let vllm_url = std::env::var("VLLM_URL").unwrap_or_else(|_| DEFAULT_VLLM_URL.to_string());
        let api_token = std::env::var("API_TOKEN").unwrap_or_default();
        let engine_timeout = std::env::var("ENGINE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_ENGINE_TIMEOUT_SECS));
        let blob_store_dir =
            std::env::var("BLOB_STORE_DIR").unwrap_or_else(|_| DEFAULT_BLOB_STORE_DIR.to_string());
        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.parse().expect("default bind addr is valid"));

        Self {
            vllm_url,
            api_token,
            engine_timeout,
            blob_store_dir,
            bind_addr,
        }
    }

    pub fn auth_enabled(&self) -> bool {
        !self.api_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_env_absent() {
        let cfg = Config {
            vllm_url: DEFAULT_VLLM_URL.to_string(),
            api_token: String::new(),
            engine_timeout: Duration::from_secs(DEFAULT_ENGINE_TIMEOUT_SECS),
            blob_store_dir: DEFAULT_BLOB_STORE_DIR.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.parse().unwrap(),
        };
        assert!(!cfg.auth_enabled());
        assert_eq!(cfg.vllm_url, DEFAULT_VLLM_URL);
    }
}
