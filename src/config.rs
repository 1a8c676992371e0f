use std::fmt;
use std::time::Duration;

use crate::mock::MockServer;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8888";
pub const DEFAULT_API_KEY: &str = "clara4014@";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro-preview-05-06";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_USER_PROMPT: &str = "Hello!";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Where the target server lives. `prefix` is the base URL's path with any
/// trailing slash removed, so `http://host/api/` joins as `http://host/api/health`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointUrl {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub prefix: String,
}

impl EndpointUrl {
    pub fn origin(&self) -> String {
        match (self.scheme, self.port) {
            (Scheme::Https, 443) => format!("https://{}", self.host),
            (Scheme::Http, 80) => format!("http://{}", self.host),
            _ => format!("{}://{}:{}", self.scheme.as_str(), self.host, self.port),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}{}", self.origin(), self.prefix, path)
    }

    fn is_loopback(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "[::1]")
    }
}

#[derive(Clone, Debug)]
pub struct SmokeConfig {
    pub endpoint: EndpointUrl,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub timeout: Option<Duration>,
    pub disable_proxy: bool,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointUrl {
                scheme: Scheme::Http,
                host: "localhost".to_string(),
                port: 8888,
                prefix: String::new(),
            },
            api_key: DEFAULT_API_KEY.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prompt: DEFAULT_USER_PROMPT.to_string(),
            timeout: None,
            disable_proxy: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidUrl(url::ParseError),
    MissingHost,
    MissingPort,
    UnsupportedScheme(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUrl(err) => write!(f, "invalid base url: {}", err),
            ConfigError::MissingHost => write!(f, "base url missing host"),
            ConfigError::MissingPort => write!(f, "base url missing port"),
            ConfigError::UnsupportedScheme(scheme) => {
                write!(f, "unsupported url scheme: {}", scheme)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidUrl(err) => Some(err),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ConfigError {
    fn from(err: url::ParseError) -> Self {
        ConfigError::InvalidUrl(err)
    }
}

impl SmokeConfig {
    /// Point the checks at `base_url`, keeping every other setting at its default.
    ///
    /// # Errors
    /// Returns an error when the URL does not parse, is not http(s), or has no host.
    pub fn from_base_url(base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
        let url = url::Url::parse(base_url.as_ref())?;
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };

        let host = match url.host() {
            Some(url::Host::Ipv6(addr)) => format!("[{}]", addr),
            Some(host) => host.to_string(),
            None => return Err(ConfigError::MissingHost),
        };

        let port = url
            .port_or_known_default()
            .ok_or(ConfigError::MissingPort)?;

        let endpoint = EndpointUrl {
            scheme,
            host,
            port,
            prefix: url.path().trim_end_matches('/').to_string(),
        };

        Ok(Self {
            disable_proxy: endpoint.is_loopback(),
            endpoint,
            ..Self::default()
        })
    }

    pub fn for_mock_server(server: &MockServer) -> Result<Self, ConfigError> {
        let mut config = Self::from_base_url(server.base_url())?;
        config.disable_proxy = true;
        Ok(config)
    }

    pub fn url_for(&self, path: &str) -> String {
        self.endpoint.url_for(path)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
