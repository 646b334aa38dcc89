use serde::Deserialize;
use std::path::PathBuf;
use ws_orchestrator::Settings;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3131";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "Settings::from_env")]
    pub settings: Settings,
}

fn default_bind_addr() -> String {
    std::env::var("WS_API_BIND").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}

fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("WS_API_DB_PATH") {
        return PathBuf::from(path);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ws")
        .join("api")
        .join("ws.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
            settings: Settings::from_env(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_path_lives_under_ws_dir() {
        if std::env::var("WS_API_DB_PATH").is_ok() {
            return;
        }
        let path = default_db_path();
        assert!(path.ends_with(".ws/api/ws.db"));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"bind_addr": "127.0.0.1:9000"}"#).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert!(config.db_path.ends_with("ws.db"));
    }
}
