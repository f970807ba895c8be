use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::types::{NodeIdentity, PeerSet, PublishAck, PublishBody, normalize_peer_list};

#[derive(Clone, Debug)]
pub struct RegistryClient {
    http: Client,
    config: RegistryConfig,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(RegistryError::Client)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Announces `identity` to the registry. Re-publishing the same identity
    /// is expected on every cycle.
    pub async fn publish(&self, identity: &NodeIdentity) -> Result<PublishAck, RegistryError> {
        let url = &self.config.publish_url;
        let request = self.http.post(url).json(&PublishBody {
            enode: identity.as_str(),
        });
        let response = self.send(url, request).await?;
        let status = response.status();
        // The status already confirms the publish; the body is informational.
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                debug!(%url, %status, error = %err, "failed to read publish response body");
                String::new()
            }
        };
        debug!(%url, %status, "published enode");
        Ok(PublishAck { status, body })
    }

    /// Fetches the current set of registered peers.
    pub async fn fetch_peers(&self) -> Result<PeerSet, RegistryError> {
        let url = &self.config.fetch_url;
        let response = self.send(url, self.http.get(url)).await?;
        let body = response
            .json::<Value>()
            .await
            .map_err(|err| RegistryError::Decode {
                url: url.clone(),
                reason: err.to_string(),
            })?;
        let peers = normalize_peer_list(body, &self.config.peer_list_field).map_err(|reason| {
            RegistryError::Decode {
                url: url.clone(),
                reason,
            }
        })?;
        debug!(%url, count = peers.len(), "fetched registry peers");
        Ok(peers)
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, RegistryError> {
        let response = request
            .header(AUTHORIZATION, self.config.credential.expose())
            .send()
            .await
            .map_err(|source| RegistryError::Transport {
                url: url.to_owned(),
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    debug!(%url, %status, error = %err, "failed to read error response body");
                    String::new()
                }
            };
            Err(RegistryError::Status {
                url: url.to_owned(),
                status,
                body,
            })
        }
    }
}
