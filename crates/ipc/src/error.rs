use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::types::RpcErrorObject;

/// Outcome of a failed control-channel call.
#[derive(Debug, Error)]
pub enum IpcError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("node returned error: {0}")]
    Rpc(RpcErrorObject),
}

impl IpcError {
    pub fn is_transport(&self) -> bool {
        matches!(self, IpcError::Transport(_))
    }

    /// Error payload reported by the node, if the node answered at all.
    pub fn rpc_error(&self) -> Option<&RpcErrorObject> {
        match self {
            IpcError::Rpc(err) => Some(err),
            IpcError::Transport(_) => None,
        }
    }
}

/// Socket-level failures: the node never produced a usable answer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed before a response was received")]
    Closed,
    #[error("response exceeds {0} bytes")]
    FrameTooLarge(usize),
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("response id {received} does not match request id {expected}")]
    IdMismatch { expected: u64, received: Value },
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}
