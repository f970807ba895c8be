use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("registry at {url} answered {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("unexpected peer list from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl RegistryError {
    /// HTTP status, when the registry answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RegistryError::Status { status, .. } => Some(*status),
            RegistryError::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            RegistryError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}
