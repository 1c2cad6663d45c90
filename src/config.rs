//! Application-level configuration loading: storage backend, persistence debounce and overlay target.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PICKLE_BOARD_CONFIG_PATH";
/// Snapshot file used by the file backend when none is configured.
const DEFAULT_MATCH_PATH: &str = "data/match.json";
/// Local overlay renderer.
pub const DEFAULT_OVERLAY_ENDPOINT: &str = "http://127.0.0.1:8765/state";
const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 120;
const DEFAULT_SSE_CAPACITY: usize = 16;

/// Where the match snapshot is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// JSON file on local disk.
    File {
        /// Snapshot file path.
        #[serde(default = "default_match_path")]
        path: PathBuf,
    },
    /// CouchDB document, configured through the `COUCH_*` environment variables.
    Couch,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: default_match_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Persistence backend.
    pub store: StoreConfig,
    /// Quiet period before a snapshot is written.
    pub save_debounce: Duration,
    /// Overlay endpoint receiving board pushes; `None` disables the push.
    pub overlay_endpoint: Option<String>,
    /// Buffered events per SSE subscriber.
    pub sse_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        store = ?app_config.store,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON configuration document; missing fields take their defaults.
    pub fn parse(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    store: StoreConfig,
    save_debounce_ms: u64,
    /// `null` disables the overlay push; absent keeps the default endpoint.
    overlay_endpoint: Option<String>,
    sse_capacity: usize,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            overlay_endpoint: Some(DEFAULT_OVERLAY_ENDPOINT.to_string()),
            sse_capacity: DEFAULT_SSE_CAPACITY,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            store: value.store,
            save_debounce: Duration::from_millis(value.save_debounce_ms),
            overlay_endpoint: value
                .overlay_endpoint
                .filter(|endpoint| !endpoint.trim().is_empty()),
            sse_capacity: value.sse_capacity.max(1),
        }
    }
}

fn default_match_path() -> PathBuf {
    PathBuf::from(DEFAULT_MATCH_PATH)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::parse("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.save_debounce, Duration::from_millis(120));
        assert_eq!(
            config.overlay_endpoint.as_deref(),
            Some(DEFAULT_OVERLAY_ENDPOINT)
        );
        assert_eq!(
            config.store,
            StoreConfig::File {
                path: PathBuf::from("data/match.json")
            }
        );
    }

    #[test]
    fn backend_and_overrides_are_read() {
        let config = AppConfig::parse(
            r#"{
                "store": {"backend": "couch"},
                "save_debounce_ms": 500,
                "overlay_endpoint": null,
                "sse_capacity": 0
            }"#,
        )
        .unwrap();
        assert_eq!(config.store, StoreConfig::Couch);
        assert_eq!(config.save_debounce, Duration::from_millis(500));
        assert_eq!(config.overlay_endpoint, None);
        assert_eq!(config.sse_capacity, 1);
    }

    #[test]
    fn file_backend_path_is_optional() {
        let config = AppConfig::parse(r#"{"store": {"backend": "file"}}"#).unwrap();
        assert_eq!(config.store, StoreConfig::default());

        let config =
            AppConfig::parse(r#"{"store": {"backend": "file", "path": "/tmp/m.json"}}"#).unwrap();
        assert_eq!(
            config.store,
            StoreConfig::File {
                path: PathBuf::from("/tmp/m.json")
            }
        );
    }

    #[test]
    fn unknown_backend_is_an_error() {
        assert!(AppConfig::parse(r#"{"store": {"backend": "mongo"}}"#).is_err());
    }
}
