use std::fmt;
use std::time::Duration;

/// Key under which wrapped peer lists are returned by the registry.
pub const DEFAULT_PEER_LIST_FIELD: &str = "enodes";

/// Static access token sent verbatim in the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for empty or whitespace-only tokens.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Endpoints and limits for talking to the registry.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    pub publish_url: String,
    pub fetch_url: String,
    pub credential: Credential,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
    pub peer_list_field: String,
}

impl RegistryConfig {
    pub fn new(
        publish_url: impl Into<String>,
        fetch_url: impl Into<String>,
        credential: Credential,
    ) -> Self {
        Self {
            publish_url: publish_url.into(),
            fetch_url: fetch_url.into(),
            credential,
            request_timeout: Some(Duration::from_secs(10)),
            peer_list_field: DEFAULT_PEER_LIST_FIELD.to_owned(),
        }
    }
}
