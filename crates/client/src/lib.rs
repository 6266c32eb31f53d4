//! HTTP client for the local shelfdeck backend.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use serde::de::DeserializeOwned;
use shelfdeck_core::{
    Command, CommandStatus, Library, LogsResponse, Series, ServerSettings, ServerSettingsUpdate,
    ServerStatus, SettingsUpdateResponse, Volume,
};

mod error;
mod events;

pub use error::{ClientError, Result};
pub use events::{EventStream, StreamMessage};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend route for a fire-and-forget command.
pub fn command_path(command: &Command) -> String {
    match command {
        Command::UpdateLibrary => "/api/update-lib".to_string(),
        Command::ClearCache => "/api/clear-cache".to_string(),
        Command::MarkRead {
            series_id,
            volume_id,
        } => format!("/api/read-volume/{series_id}/{volume_id}"),
        Command::MarkUnread {
            series_id,
            volume_id,
        } => format!("/api/unread-volume/{series_id}/{volume_id}"),
        Command::StartCache { series_id } => format!("/api/cache/serie/{series_id}"),
        Command::StopCache { series_id } => format!("/api/cache/stop/serie/{series_id}"),
    }
}

/// Addresses a single page image; `page` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRef {
    pub series_id: u64,
    pub volume_id: u64,
    pub chapter_id: u64,
    pub page: u32,
}

impl PageRef {
    pub fn path(&self) -> String {
        // The backend numbers pages from 1.
        format!(
            "/api/picture/{}/{}/{}/{}",
            self.series_id,
            self.volume_id,
            self.chapter_id,
            self.page.saturating_add(1)
        )
    }
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    page_timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: &str, page_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn send(&self, request: RequestBuilder) -> Result<reqwest::blocking::Response> {
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self
            .http
            .get(self.url(path))
            .header(ACCEPT, "application/json");
        let response = self.send(request)?;
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|err| {
            tracing::warn!(path, error = %err, "failed to decode backend response");
            ClientError::Decode(format!("{path}: {err}"))
        })
    }

    fn get_bytes(&self, path: &str, timeout: Option<Duration>) -> Result<Vec<u8>> {
        let mut request = self.http.get(self.url(path));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = self.send(request)?;
        Ok(response.bytes()?.to_vec())
    }

    pub fn status(&self) -> Result<ServerStatus> {
        self.get_json("/api/status")
    }

    pub fn libraries(&self) -> Result<Vec<Library>> {
        self.get_json("/api/library")
    }

    pub fn series(&self, library_id: u64) -> Result<Vec<Series>> {
        self.get_json(&format!("/api/series/{library_id}"))
    }

    pub fn volumes(&self, series_id: u64) -> Result<Vec<Volume>> {
        self.get_json(&format!("/api/volumes/{series_id}"))
    }

    pub fn series_cover(&self, series_id: u64) -> Result<Vec<u8>> {
        self.get_bytes(&format!("/api/series-cover/{series_id}"), None)
    }

    pub fn volume_cover(&self, volume_id: u64) -> Result<Vec<u8>> {
        self.get_bytes(&format!("/api/volumes-cover/{volume_id}"), None)
    }

    pub fn page(&self, page: PageRef) -> Result<Vec<u8>> {
        self.get_bytes(&page.path(), Some(self.page_timeout))
    }

    pub fn command(&self, command: Command) -> Result<CommandStatus> {
        tracing::info!(command = command.label(), "sending command");
        self.get_json(&command_path(&command))
    }

    pub fn server_settings(&self) -> Result<ServerSettings> {
        self.get_json("/api/server-settings")
    }

    pub fn update_server_settings(
        &self,
        update: &ServerSettingsUpdate,
    ) -> Result<SettingsUpdateResponse> {
        let request = self
            .http
            .post(self.url("/api/server-settings"))
            .header(ACCEPT, "application/json")
            .json(update);
        let response = self.send(request)?;
        let body = response.text()?;
        serde_json::from_str(&body)
            .map_err(|err| ClientError::Decode(format!("/api/server-settings: {err}")))
    }

    pub fn logs(&self) -> Result<LogsResponse> {
        let request = self
            .http
            .get(self.url("/api/logs"))
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache");
        let response = self.send(request)?;
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|err| ClientError::Decode(format!("/api/logs: {err}")))
    }
}
