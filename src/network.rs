use std::fmt;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;

use crate::config::SmokeConfig;

/// Build the blocking client shared by every check in a run.
///
/// No timeout is applied unless the config asks for one; reqwest's own
/// 30 second default is switched off.
pub fn build_client(config: &SmokeConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().timeout(config.timeout);

    if config.disable_proxy {
        builder = builder.no_proxy();
    }

    builder.build()
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckSuccess {
    pub status: u16,
    pub body: serde_json::Value,
}

#[derive(Debug)]
pub enum CheckError {
    Transport(reqwest::Error),
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },
    Decode {
        status: StatusCode,
        body: String,
        source: serde_json::Error,
    },
}

impl CheckError {
    /// Raw text of the response that caused the failure, when there was one.
    pub fn response_text(&self) -> Option<&str> {
        match self {
            CheckError::Transport(_) => None,
            CheckError::Status { body, .. } | CheckError::Decode { body, .. } => Some(body),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CheckError::Transport(err) => err.status(),
            CheckError::Status { status, .. } | CheckError::Decode { status, .. } => Some(*status),
        }
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, CheckError::Transport(err) if err.is_connect())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CheckError::Transport(err) if err.is_timeout())
    }

    /// `Display` followed by every `source()` in the chain, joined by `": "`.
    pub fn describe(&self) -> String {
        let mut description = self.to_string();
        let mut source = std::error::Error::source(self);

        while let Some(err) = source {
            description.push_str(": ");
            description.push_str(&err.to_string());
            source = err.source();
        }

        description
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Transport(err) => write!(f, "{}", err),
            CheckError::Status { status, url, .. } => {
                let kind = if status.is_client_error() {
                    "Client Error"
                } else if status.is_server_error() {
                    "Server Error"
                } else {
                    "Unexpected Status"
                };

                write!(
                    f,
                    "{} {}: {} for url: {}",
                    status.as_u16(),
                    kind,
                    status.canonical_reason().unwrap_or("Unknown"),
                    url
                )
            }
            CheckError::Decode { status, .. } => {
                write!(f, "status {} response body is not valid JSON", status.as_u16())
            }
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckError::Transport(err) => std::error::Error::source(err),
            CheckError::Status { .. } => None,
            CheckError::Decode { source, .. } => Some(source),
        }
    }
}

impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        CheckError::Transport(err)
    }
}

/// Send `request` and parse a 2xx JSON response.
///
/// Any non-2xx status is an error carrying the raw body, as is a 2xx body that
/// does not parse as JSON.
pub fn execute(request: RequestBuilder) -> Result<CheckSuccess, CheckError> {
    let (client, request) = request.build_split();
    let request = request?;
    let url = request.url().to_string();
    tracing::debug!(method = %request.method(), %url, "sending request");

    let response = client.execute(request)?;
    read_response(response, url)
}

fn read_response(
    response: reqwest::blocking::Response,
    url: String,
) -> Result<CheckSuccess, CheckError> {
    let status = response.status();
    let body = response.text()?;
    tracing::debug!(status = status.as_u16(), %url, bytes = body.len(), "received response");

    if !status.is_success() {
        return Err(CheckError::Status { status, url, body });
    }

    match serde_json::from_str(&body) {
        Ok(json) => Ok(CheckSuccess {
            status: status.as_u16(),
            body: json,
        }),
        Err(source) => Err(CheckError::Decode {
            status,
            body,
            source,
        }),
    }
}
