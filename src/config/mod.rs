//! Application configuration

use std::env;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Claims AI backend.
    pub api_url: String,
    /// Per-request timeout, covering the full streamed response.
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            api_url: env::var("CLAIMS_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".into()),
            timeout_secs: env::var("CLAIMS_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(120),
        })
    }
}
