use std::fmt;

use tracing::level_filters::LevelFilter;
use tracing::subscriber::{set_global_default, SetGlobalDefaultError};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

#[derive(Debug)]
pub enum TelemetryError {
    UnknownLevel(String),
    InvalidFilter(ParseError),
    Install(SetGlobalDefaultError),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::UnknownLevel(level) => write!(f, "unknown log level: {}", level),
            TelemetryError::InvalidFilter(err) => write!(f, "invalid log filter: {}", err),
            TelemetryError::Install(err) => write!(f, "failed to install subscriber: {}", err),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::UnknownLevel(_) => None,
            TelemetryError::InvalidFilter(err) => Some(err),
            TelemetryError::Install(err) => Some(err),
        }
    }
}

/// Parse `filter` in `EnvFilter` directive syntax (`warn`, `endpoint_smoke=debug,warn`).
///
/// A directive without `=` must be a level, so a typo like `debg` is an error
/// rather than a filter on a target named `debg`.
pub fn parse_filter(filter: &str) -> Result<EnvFilter, TelemetryError> {
    for directive in filter.split(',').map(str::trim) {
        if directive.is_empty() || directive.contains('=') {
            continue;
        }
        if directive.parse::<LevelFilter>().is_err() {
            return Err(TelemetryError::UnknownLevel(directive.to_string()));
        }
    }

    EnvFilter::try_new(filter).map_err(TelemetryError::InvalidFilter)
}

/// Install a global subscriber that writes diagnostics to `sink`.
pub fn init_subscriber<Sink>(filter: &str, sink: Sink) -> Result<(), TelemetryError>
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = parse_filter(filter)?;
    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(sink);

    let registry = Registry::default().with(env_filter).with(formatting_layer);

    set_global_default(registry).map_err(TelemetryError::Install)
}
