use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Whether the backend is logged in to the media server.
    pub status: bool,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub logged_as: String,
    /// Local cache size in GB.
    #[serde(default)]
    pub cache: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStatus {
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettingsUpdate {
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ServerSettingsUpdate {
    /// Builds an update after validating the address; blank credentials are left out.
    pub fn new(ip: &str, username: &str, password: &str) -> Result<Self, SettingsError> {
        let ip = ip.trim();
        validate_server_address(ip)?;
        let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_string());
        Ok(Self {
            ip: ip.to_string(),
            username: non_empty(username.trim()),
            password: non_empty(password),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdateResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub current_settings: Option<ServerSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("server address is required")]
    MissingAddress,
    #[error("invalid port number. Must be between 1 and 65535")]
    InvalidPort,
}

/// Accepts `host` or `host:port` with a port in 1..=65535.
pub fn validate_server_address(address: &str) -> Result<(), SettingsError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(SettingsError::MissingAddress);
    }
    let Some((host, port)) = address.rsplit_once(':') else {
        return Ok(());
    };
    if host.trim().is_empty() {
        return Err(SettingsError::MissingAddress);
    }
    match port.trim().parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Ok(()),
        _ => Err(SettingsError::InvalidPort),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
    Other,
}

impl LogLevel {
    pub fn classify(line: &str) -> Self {
        if line.contains("[ERROR]") {
            LogLevel::Error
        } else if line.contains("[WARNING]") {
            LogLevel::Warning
        } else if line.contains("[INFO]") {
            LogLevel::Info
        } else if line.contains("[DEBUG]") {
            LogLevel::Debug
        } else {
            LogLevel::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_without_port_is_accepted() {
        assert_eq!(validate_server_address("192.168.1.100"), Ok(()));
        assert_eq!(validate_server_address("kavita.local:5001"), Ok(()));
    }

    #[test]
    fn malformed_ports_are_rejected() {
        assert_eq!(
            validate_server_address("192.168.1.100:"),
            Err(SettingsError::InvalidPort)
        );
        assert_eq!(
            validate_server_address("host:0"),
            Err(SettingsError::InvalidPort)
        );
        assert_eq!(
            validate_server_address("host:65536"),
            Err(SettingsError::InvalidPort)
        );
        assert_eq!(
            validate_server_address("host:abc"),
            Err(SettingsError::InvalidPort)
        );
    }

    #[test]
    fn empty_address_is_rejected() {
        assert_eq!(
            validate_server_address("  "),
            Err(SettingsError::MissingAddress)
        );
        assert_eq!(
            validate_server_address(":5000"),
            Err(SettingsError::MissingAddress)
        );
    }

    #[test]
    fn update_skips_blank_credentials() -> Result<(), SettingsError> {
        let update = ServerSettingsUpdate::new(" 10.0.0.2:5000 ", "", "")?;
        assert_eq!(update.ip, "10.0.0.2:5000");
        assert_eq!(update.username, None);
        assert_eq!(update.password, None);

        let update = ServerSettingsUpdate::new("10.0.0.2", "reader", "hunter2")?;
        assert_eq!(update.username.as_deref(), Some("reader"));
        assert_eq!(update.password.as_deref(), Some("hunter2"));
        Ok(())
    }

    #[test]
    fn update_serializes_without_missing_fields() {
        let update = ServerSettingsUpdate {
            ip: "h:1".to_string(),
            username: None,
            password: None,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"ip":"h:1"}"#);
    }

    #[test]
    fn log_lines_classify_by_tag() {
        assert_eq!(LogLevel::classify("[ERROR] boom"), LogLevel::Error);
        assert_eq!(LogLevel::classify("x [WARNING] y"), LogLevel::Warning);
        assert_eq!(LogLevel::classify("[INFO] ok"), LogLevel::Info);
        assert_eq!(LogLevel::classify("[DEBUG] ok"), LogLevel::Debug);
        assert_eq!(LogLevel::classify("plain"), LogLevel::Other);
    }

    #[test]
    fn status_tolerates_missing_fields() {
        let status: ServerStatus = serde_json::from_str(r#"{"status": false}"#).unwrap();
        assert!(!status.status);
        assert_eq!(status.cache, 0.0);
    }
}
