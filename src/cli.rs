use std::time::Duration;

use clap::Parser;

use crate::config::{ConfigError, SmokeConfig, DEFAULT_API_KEY, DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Parser)]
#[command(name = "endpoint-smoke")]
#[command(about = "Smoke test the health, chat completion and model listing endpoints of a local server", long_about = None)]
pub struct Args {
    /// Server to test
    #[arg(long, default_value_t = String::from(DEFAULT_BASE_URL))]
    pub base_url: String,

    /// Bearer token sent to the API endpoints
    #[arg(long, default_value_t = String::from(DEFAULT_API_KEY))]
    pub api_key: String,

    /// Model identifier for the chat completion request
    #[arg(long, default_value_t = String::from(DEFAULT_MODEL))]
    pub model: String,

    /// Per-request timeout; requests wait indefinitely when omitted
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Diagnostic filter for stderr, e.g. `debug`
    #[arg(long, default_value_t = String::from("warn"))]
    pub log_level: String,
}

impl Args {
    pub fn into_config(self) -> Result<SmokeConfig, ConfigError> {
        Ok(SmokeConfig::from_base_url(&self.base_url)?
            .with_api_key(self.api_key)
            .with_model(self.model)
            .with_timeout(self.timeout_secs.map(Duration::from_secs)))
    }
}
