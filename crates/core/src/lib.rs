//! Core domain types for shelfdeck.

use serde::{Deserialize, Serialize};

mod command;
mod event;
mod model;
mod server;

pub use command::Command;
pub use event::BackendEvent;
pub use model::{Library, Series, Volume, order_series};
pub use server::{
    CommandStatus, LogLevel, LogsResponse, ServerSettings, ServerSettingsUpdate, ServerStatus,
    SettingsError, SettingsUpdateResponse, validate_server_address,
};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:11337";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend_url: String,
    pub grid_columns: usize,
    pub status_poll_secs: u64,
    pub volumes_poll_secs: u64,
    pub page_timeout_secs: u64,
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err("unknown theme"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            grid_columns: 8,
            status_poll_secs: 5,
            volumes_poll_secs: 1,
            page_timeout_secs: 12,
            theme: Theme::Dark,
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.grid_columns = self.grid_columns.clamp(1, 12);
        self.status_poll_secs = self.status_poll_secs.clamp(1, 60);
        self.volumes_poll_secs = self.volumes_poll_secs.clamp(1, 60);
        self.page_timeout_secs = self.page_timeout_secs.clamp(10, 15);

        let url = self.backend_url.trim().trim_end_matches('/');
        self.backend_url = if url.is_empty() {
            DEFAULT_BACKEND_URL.to_string()
        } else if url.contains("://") {
            url.to_string()
        } else {
            format!("http://{url}")
        };
    }

    pub fn cycle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        };
    }

    /// WebSocket endpoint derived from the HTTP base URL.
    pub fn events_url(&self) -> String {
        let base = self.backend_url.trim_end_matches('/');
        let ws = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{base}")
        };
        format!("{ws}/ws")
    }
}

/// Identifies which list a persisted resume point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResumeKey {
    Dashboard,
    Shelf,
    Library(u64),
    Series(u64),
}

impl ResumeKey {
    pub fn storage_key(&self) -> String {
        match self {
            ResumeKey::Dashboard => "dashboard".to_string(),
            ResumeKey::Shelf => "shelf".to_string(),
            ResumeKey::Library(id) => format!("library:{id}"),
            ResumeKey::Series(id) => format!("series:{id}"),
        }
    }
}

impl std::str::FromStr for ResumeKey {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once(':') {
            None if value == "dashboard" => Ok(ResumeKey::Dashboard),
            None if value == "shelf" => Ok(ResumeKey::Shelf),
            Some(("library", id)) => id
                .parse()
                .map(ResumeKey::Library)
                .map_err(|_| "bad library id"),
            Some(("series", id)) => id
                .parse()
                .map(ResumeKey::Series)
                .map_err(|_| "bad series id"),
            _ => Err("unknown resume key"),
        }
    }
}

impl std::fmt::Display for ResumeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.storage_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_point_at_local_backend() {
        let settings = Settings::default();
        assert_eq!(settings.backend_url, "http://localhost:11337");
        assert_eq!(settings.grid_columns, 8);
    }

    #[test]
    fn cycle_theme_rotates() {
        let mut settings = Settings::default();
        assert_eq!(settings.theme, Theme::Dark);
        settings.cycle_theme();
        assert_eq!(settings.theme, Theme::Light);
        settings.cycle_theme();
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn theme_parses_strings() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(" LIGHT ".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn settings_normalize_clamps_and_fixes_url() {
        let mut settings = Settings {
            backend_url: " 127.0.0.1:9000/ ".to_string(),
            grid_columns: 0,
            status_poll_secs: 0,
            volumes_poll_secs: 500,
            page_timeout_secs: 3,
            theme: Theme::Light,
        };
        settings.normalize();
        assert_eq!(settings.backend_url, "http://127.0.0.1:9000");
        assert_eq!(settings.grid_columns, 1);
        assert_eq!(settings.status_poll_secs, 1);
        assert_eq!(settings.volumes_poll_secs, 60);
        assert_eq!(settings.page_timeout_secs, 10);
    }

    #[test]
    fn empty_backend_url_falls_back_to_default() {
        let mut settings = Settings {
            backend_url: "   ".to_string(),
            ..Settings::default()
        };
        settings.normalize();
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn events_url_swaps_scheme() {
        let mut settings = Settings::default();
        assert_eq!(settings.events_url(), "ws://localhost:11337/ws");
        settings.backend_url = "https://deck.local".to_string();
        assert_eq!(settings.events_url(), "wss://deck.local/ws");
    }

    #[test]
    fn resume_keys_are_distinct_per_owner() {
        assert_eq!(ResumeKey::Shelf.storage_key(), "shelf");
        assert_eq!(ResumeKey::Library(4).storage_key(), "library:4");
        assert_ne!(
            ResumeKey::Library(4).storage_key(),
            ResumeKey::Series(4).storage_key()
        );
    }

    #[test]
    fn resume_keys_parse_back() {
        for key in [
            ResumeKey::Dashboard,
            ResumeKey::Shelf,
            ResumeKey::Library(3),
            ResumeKey::Series(12),
        ] {
            assert_eq!(key.storage_key().parse::<ResumeKey>(), Ok(key));
        }
        assert!("series:abc".parse::<ResumeKey>().is_err());
        assert!("volume:1".parse::<ResumeKey>().is_err());
    }
}
