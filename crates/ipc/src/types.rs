use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IpcError, TransportError};

pub const JSONRPC_VERSION: &str = "2.0";

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// A single JSON-RPC 2.0 call as written to the control socket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

impl RpcRequest {
    /// Builds a request tagged with a process-wide unique id.
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            method: method.into(),
            params,
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl RpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_owned()),
            result: Some(result),
            error: None,
            id: Some(Value::from(id)),
        }
    }

    pub fn failure(id: u64, error: RpcErrorObject) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_owned()),
            result: None,
            error: serde_json::to_value(error).ok(),
            id: Some(Value::from(id)),
        }
    }

    /// Resolves the response for the request carrying `expected_id`.
    ///
    /// A present, non-null `error` always wins over `result`. A missing
    /// `result` on success is reported as `null`.
    pub fn into_result(self, expected_id: u64) -> Result<Value, IpcError> {
        if let Some(received) = self.id {
            if received != Value::from(expected_id) {
                return Err(TransportError::IdMismatch {
                    expected: expected_id,
                    received,
                }
                .into());
            }
        }
        match self.error {
            Some(payload) => Err(IpcError::Rpc(RpcErrorObject::from_payload(payload))),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Error object reported by the node for a well-formed request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Accepts standard `{code, message, data}` objects; anything else is kept
    /// verbatim in `data` with code 0.
    pub fn from_payload(payload: Value) -> Self {
        match serde_json::from_value::<RpcErrorObject>(payload.clone()) {
            Ok(err) => err,
            Err(_) => {
                let message = match &payload {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                Self {
                    code: 0,
                    message,
                    data: Some(payload),
                }
            }
        }
    }
}

impl fmt::Display for RpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_ids_are_unique() {
        let first = RpcRequest::new("admin_nodeInfo", Vec::new());
        let second = RpcRequest::new("admin_nodeInfo", Vec::new());
        assert_ne!(first.id, second.id);
        assert_eq!(first.jsonrpc, "2.0");
    }

    #[test]
    fn error_field_wins_over_result() {
        let response: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "result": true,
            "error": {"code": -32000, "message": "invalid enode"}
        }))
        .expect("parse");
        let err = response.into_result(7).expect_err("error must win");
        let rpc = err.rpc_error().expect("rpc error");
        assert_eq!(rpc.code, -32000);
        assert_eq!(rpc.message, "invalid enode");
    }

    #[test]
    fn null_error_is_success() {
        let response: RpcResponse =
            serde_json::from_value(json!({"id": 3, "result": {"enode": "enode://x"}, "error": null}))
                .expect("parse");
        let value = response.into_result(3).expect("success");
        assert_eq!(value["enode"], "enode://x");
    }

    #[test]
    fn missing_result_is_null() {
        let response = RpcResponse {
            id: Some(json!(5)),
            ..Default::default()
        };
        assert_eq!(response.into_result(5).expect("success"), Value::Null);
    }

    #[test]
    fn mismatched_id_is_transport_error() {
        let response = RpcResponse::success(10, json!(true));
        let err = response.into_result(11).expect_err("mismatch");
        assert!(err.is_transport());
    }

    #[test]
    fn non_standard_error_payload_is_preserved() {
        let rpc = RpcErrorObject::from_payload(json!("peer limit reached"));
        assert_eq!(rpc.code, 0);
        assert_eq!(rpc.message, "peer limit reached");
        assert_eq!(rpc.data, Some(json!("peer limit reached")));
    }
}
