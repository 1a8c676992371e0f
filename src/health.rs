use reqwest::blocking::{Client, RequestBuilder};

use crate::api::{Check, HEALTH_PATH};
use crate::config::SmokeConfig;

/// Liveness check: a bare `GET /health`.
pub struct HealthCheck {
    pub url: String,
}

impl HealthCheck {
    pub fn new(config: &SmokeConfig) -> Self {
        Self {
            url: config.url_for(HEALTH_PATH),
        }
    }
}

impl Check for HealthCheck {
    fn subject(&self) -> &'static str {
        "Health Check"
    }

    fn label(&self) -> &'static str {
        "Health Check"
    }

    fn build_request(&self, client: &Client) -> RequestBuilder {
        client.get(&self.url)
    }
}
