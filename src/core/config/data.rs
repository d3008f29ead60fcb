use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::constants::{BASE_URL_ENV_VAR, DEFAULT_BASE_URL};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the streaming chat endpoint (e.g., "http://localhost:8000")
    pub base_url: Option<String>,
    /// Give up opening a connection after this many seconds
    pub connect_timeout_secs: Option<u64>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Pick the endpoint: command line, then environment, then config file,
    /// then the built-in default.
    pub fn resolve_base_url(&self, cli_override: Option<&str>, env_value: Option<&str>) -> String {
        non_empty(cli_override)
            .or_else(|| non_empty(env_value))
            .or_else(|| non_empty(self.base_url.as_deref()))
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string()
    }

    /// [`Config::resolve_base_url`] with the environment read from the process.
    pub fn effective_base_url(&self, cli_override: Option<&str>) -> String {
        let env_value = std::env::var(BASE_URL_ENV_VAR).ok();
        self.resolve_base_url(cli_override, env_value.as_deref())
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// HTTP client configured from this config.
    pub fn build_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        builder.build()
    }
}
