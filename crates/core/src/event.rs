use serde::{Deserialize, Serialize};

/// Push notifications delivered by the backend over its WebSocket channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BackendEvent {
    ConnectionStatus {
        online: bool,
    },
    ProgressUploadStart,
    ProgressUploadEnd,
    CacheStart {
        #[serde(default)]
        title: String,
    },
    CacheVolume {
        #[serde(default)]
        title: String,
    },
    CacheEnd {
        #[serde(default)]
        title: String,
    },
}

impl BackendEvent {
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    pub fn message(&self) -> String {
        match self {
            BackendEvent::ConnectionStatus { online: true } => "Connected to server".to_string(),
            BackendEvent::ConnectionStatus { online: false } => {
                "Lost connection to server".to_string()
            }
            BackendEvent::ProgressUploadStart => "Uploading reading progress...".to_string(),
            BackendEvent::ProgressUploadEnd => "Reading progress uploaded".to_string(),
            BackendEvent::CacheStart { title } => format!("Caching started: {title}"),
            BackendEvent::CacheVolume { title } => format!("Cached volume: {title}"),
            BackendEvent::CacheEnd { title } => format!("Caching finished: {title}"),
        }
    }
}
