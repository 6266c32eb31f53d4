use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("backend unreachable: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("request failed: {0}")]
    Request(String),
}

impl ClientError {
    /// True when the backend itself could not be reached, as opposed to a failed command.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ClientError::Connect(_) | ClientError::Timeout(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            ClientError::Timeout(message)
        } else if err.is_connect() {
            ClientError::Connect(message)
        } else if err.is_decode() {
            ClientError::Decode(message)
        } else if let Some(status) = err.status() {
            ClientError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            ClientError::Request(message)
        }
    }
}
