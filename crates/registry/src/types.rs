use std::collections::BTreeSet;
use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Opaque connection-address string such as `enode://<id>@<host>:<port>`.
///
/// Only equality matters; the format belongs to the node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Enode(String);

/// How other nodes reach this node.
pub type NodeIdentity = Enode;
/// A candidate peer advertised by the registry.
pub type PeerAddress = Enode;
pub type PeerSet = BTreeSet<Enode>;

impl Enode {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Enode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Enode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Enode {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Serialize)]
pub(crate) struct PublishBody<'a> {
    pub enode: &'a str,
}

/// Successful answer to a publish call.
#[derive(Clone, Debug)]
pub struct PublishAck {
    pub status: StatusCode,
    pub body: String,
}

/// Turns either `["a", ...]` or `{"<field>": ["a", ...]}` into a peer set.
///
/// Entries that are not non-empty strings are dropped with a warning. Any
/// other shape is rejected with a short reason.
pub fn normalize_peer_list(body: Value, field: &str) -> Result<PeerSet, String> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove(field) {
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                return Err(format!("field `{field}` is {}, expected array", kind(&other)));
            }
            None => return Err(format!("object has no `{field}` field")),
        },
        other => return Err(format!("body is {}, expected array or object", kind(&other))),
    };

    let mut peers = PeerSet::new();
    for entry in entries {
        match entry {
            Value::String(address) if !address.trim().is_empty() => {
                peers.insert(Enode(address));
            }
            other => warn!(entry = %other, "ignoring invalid peer list entry"),
        }
    }
    Ok(peers)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
