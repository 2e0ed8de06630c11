//! Daemon settings loaded from `settings.yaml` in the config directory.
//!
//! Every field is optional in the file; a missing file yields the defaults.
//!
//! ```yaml
//! socket_path: /run/survbot.sock
//! poll_interval_ms: 50
//! request_timeout_ms: 10000
//! log_filter: "survbot_core=debug,info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::daemon::DaemonConfig;
use crate::error::SettingsError;


pub const SETTINGS_FILE: &str = "settings.yaml";
pub const SOCKET_FILE: &str = "survbot.sock";


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Daemon socket. Defaults to `<config_dir>/survbot.sock`.
    pub socket_path: Option<PathBuf>,

    /// Accept-loop sleep when idle.
    pub poll_interval_ms: u64,

    /// Socket read timeout, for both daemon workers and clients.
    pub request_timeout_ms: u64,

    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}


impl Default for Settings {
    fn default() -> Self {
        Settings {
            socket_path: None,
            poll_interval_ms: 50,
            request_timeout_ms: 10_000,
            log_filter: "info".into(),
        }
    }
}


impl Settings {
    pub fn socket_path(&self, config_dir: &Path) -> PathBuf {
        self.socket_path
            .clone()
            .unwrap_or_else(|| config_dir.join(SOCKET_FILE))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn daemon_config(&self) -> DaemonConfig {
        DaemonConfig {
            poll_interval_ms: self.poll_interval_ms,
            request_timeout_ms: self.request_timeout_ms,
        }
    }
}


/// Load settings from a YAML file. A missing file is not an error.
pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(source) => Err(SettingsError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}


/// Load `settings.yaml` from a config directory.
pub fn load_from_dir(config_dir: &Path) -> Result<Settings, SettingsError> {
    load(&config_dir.join(SETTINGS_FILE))
}


/// Parse settings from a YAML string. Empty input yields the defaults.
pub fn parse(content: &str) -> Result<Settings, SettingsError> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    Ok(serde_yaml::from_str(content)?)
}
