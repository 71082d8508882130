use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::reveal::RevealTiming;
use crate::model::history;

pub const APP_DIR: &str = "travel_chat_client";
pub const ENDPOINT_ENV: &str = "CHAT_BACKEND_URL";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/chat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub endpoint: String,
    pub user_id: String,

    pub debounce_ms: u64,
    pub request_timeout_ms: u64,
    pub max_attempts: u32,

    pub reveal_step_ms: u64,
    pub reveal_grace_ms: u64,

    pub history_capacity: usize,
    pub label_limit: usize,
    pub label_display_cap: usize,

    /// Longer submissions are cut and marked with an ellipsis.
    pub max_message_chars: usize,

    /// Start without a session id; the first submission only creates one.
    pub lazy_session: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            user_id: "user1".into(),
            debounce_ms: 1000,
            request_timeout_ms: 10_000,
            max_attempts: 3,
            reveal_step_ms: 20,
            reveal_grace_ms: 500,
            history_capacity: history::DEFAULT_CAPACITY,
            label_limit: history::DEFAULT_LABEL_LIMIT,
            label_display_cap: history::DEFAULT_DISPLAY_CAP,
            max_message_chars: 500,
            lazy_session: false,
        }
    }
}

impl ClientSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn reveal_timing(&self) -> RevealTiming {
        RevealTiming {
            step: Duration::from_millis(self.reveal_step_ms),
            locations_grace: Duration::from_millis(self.reveal_grace_ms),
        }
    }

    /// Apply the endpoint override from the environment, if set and non-empty.
    pub fn with_env_override(mut self, endpoint: Option<String>) -> Self {
        if let Some(url) = endpoint.filter(|u| !u.trim().is_empty()) {
            self.endpoint = url.trim().to_string();
        }
        self
    }
}

pub fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push("settings.json");
    path
}

/// Read settings from `path`; a missing file yields defaults.
pub fn load_settings_from(path: &Path) -> ClientSettings {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return ClientSettings::default(),
    };
    match serde_json::from_str(&raw) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings: {}", e);
            ClientSettings::default()
        }
    }
}

/// Settings file plus the `CHAT_BACKEND_URL` override.
pub fn load_settings() -> ClientSettings {
    load_settings_from(&settings_path()).with_env_override(std::env::var(ENDPOINT_ENV).ok())
}

pub fn save_settings_to(path: &Path, settings: &ClientSettings) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, serde_json::to_string_pretty(settings)?)?;
    Ok(())
}

pub fn save_settings(settings: &ClientSettings) -> anyhow::Result<()> {
    save_settings_to(&settings_path(), settings)
}
