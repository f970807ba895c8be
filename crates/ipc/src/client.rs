use std::path::Path;

use serde_json::Value;
use tokio::io::BufReader;
use tokio::net::UnixStream;
use tracing::{debug, trace};

use crate::codec::{read_response, write_request};
use crate::config::IpcConfig;
use crate::error::{IpcError, TransportError};
use crate::types::{RpcRequest, RpcResponse};

pub const NODE_INFO_METHOD: &str = "admin_nodeInfo";
pub const ADD_PEER_METHOD: &str = "admin_addPeer";

/// Stateless handle to the node's control socket.
///
/// Cloning is cheap; each call dials its own connection, so concurrent calls
/// never share a socket.
#[derive(Clone, Debug)]
pub struct IpcClient {
    config: IpcConfig,
}

impl IpcClient {
    pub fn new(config: IpcConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Sends one request and waits for its response.
    ///
    /// The connection is closed once this returns, whatever the outcome.
    pub async fn invoke(&self, method: &str, params: Vec<Value>) -> Result<Value, IpcError> {
        let request = RpcRequest::new(method, params);
        let response = match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.exchange(&request))
                .await
                .map_err(|_| TransportError::Timeout(limit))??,
            None => self.exchange(&request).await?,
        };
        let outcome = response.into_result(request.id);
        if let Err(err) = &outcome {
            debug!(method, id = request.id, error = %err, "ipc call failed");
        }
        outcome
    }

    pub async fn node_info(&self) -> Result<Value, IpcError> {
        self.invoke(NODE_INFO_METHOD, Vec::new()).await
    }

    pub async fn add_peer(&self, enode: &str) -> Result<Value, IpcError> {
        self.invoke(ADD_PEER_METHOD, vec![Value::from(enode)]).await
    }

    async fn exchange(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
        let path = &self.config.path;
        let stream = UnixStream::connect(path)
            .await
            .map_err(|source| TransportError::Connect {
                path: path.clone(),
                source,
            })?;
        let (reader, mut writer) = stream.into_split();
        trace!(method = %request.method, id = request.id, "sending ipc request");
        write_request(&mut writer, request).await?;
        let mut reader = BufReader::new(reader);
        read_response(&mut reader, self.config.max_response_size).await
    }
}
