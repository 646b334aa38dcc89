//! Subscriber setup for the service binary.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "ws_api=debug,ws_orchestrator=debug,tower_http=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    pub fn from_env() -> Self {
        std::env::var("WS_LOG_FORMAT")
            .map(|value| Self::parse(&value))
            .unwrap_or(LogFormat::Text)
    }
}

/// Filter from `WS_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("WS_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

pub fn init() {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());

    match LogFormat::from_env() {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
