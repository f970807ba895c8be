//! HTTP client for the shared enode registry.
//!
//! The registry is a bulletin board: nodes `POST` their own enode and `GET`
//! everybody else's. Both calls carry a static `Authorization` credential.

mod client;
mod config;
mod error;
mod types;

pub use client::RegistryClient;
pub use config::{Credential, DEFAULT_PEER_LIST_FIELD, RegistryConfig};
pub use error::RegistryError;
pub use reqwest::Url;
pub use types::{Enode, NodeIdentity, PeerAddress, PeerSet, PublishAck, normalize_peer_list};
