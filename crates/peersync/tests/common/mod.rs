#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use ipc::{ADD_PEER_METHOD, IpcClient, IpcConfig, NODE_INFO_METHOD, RpcErrorObject, RpcRequest, RpcResponse};
use parking_lot::Mutex;
use registry::{Credential, RegistryClient, RegistryConfig};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::task::JoinHandle;

pub const TOKEN: &str = "T";
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Geth-like node behind a Unix socket in a temporary directory.
pub struct FakeNode {
    _dir: TempDir,
    path: PathBuf,
    state: Arc<NodeState>,
    task: JoinHandle<()>,
}

#[derive(Default)]
pub struct NodeState {
    /// Value of the `enode` field in `admin_nodeInfo`; `None` omits the field.
    pub enode: Mutex<Option<String>>,
    /// Peers for which `admin_addPeer` answers with an error.
    pub failing: Mutex<HashSet<String>>,
    /// Peers for which `admin_addPeer` answers `false`.
    pub refused: Mutex<HashSet<String>>,
    pub requests: Mutex<Vec<RpcRequest>>,
}

impl FakeNode {
    pub fn spawn(enode: Option<&str>) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("geth.ipc");
        let listener = UnixListener::bind(&path).expect("bind ipc socket");
        let state = Arc::new(NodeState::default());
        *state.enode.lock() = enode.map(str::to_owned);

        let accept_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let state = Arc::clone(&accept_state);
                tokio::spawn(async move {
                    let (reader, mut writer) = stream.into_split();
                    let mut lines = BufReader::new(reader).lines();
                    let Ok(Some(line)) = lines.next_line().await else {
                        return;
                    };
                    let request: RpcRequest = serde_json::from_str(&line).expect("request json");
                    let response = state.answer(&request);
                    state.requests.lock().push(request);
                    let mut encoded = serde_json::to_vec(&response).expect("encode");
                    encoded.push(b'\n');
                    let _ = writer.write_all(&encoded).await;
                });
            }
        });

        Self {
            _dir: dir,
            path,
            state,
            task,
        }
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn client(&self) -> IpcClient {
        IpcClient::new(IpcConfig {
            path: self.path.clone(),
            call_timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        })
    }

    pub fn fail_peer(&self, enode: &str) {
        self.state.failing.lock().insert(enode.to_owned());
    }

    pub fn refuse_peer(&self, enode: &str) {
        self.state.refused.lock().insert(enode.to_owned());
    }

    /// Peers passed to `admin_addPeer`, in call order.
    pub fn add_peer_calls(&self) -> Vec<String> {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|request| request.method == ADD_PEER_METHOD)
            .filter_map(|request| request.params.first().and_then(Value::as_str))
            .map(str::to_owned)
            .collect()
    }

    pub fn node_info_calls(&self) -> usize {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|request| request.method == NODE_INFO_METHOD)
            .count()
    }
}

impl Drop for FakeNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl NodeState {
    fn answer(&self, request: &RpcRequest) -> RpcResponse {
        match request.method.as_str() {
            NODE_INFO_METHOD => {
                let mut info = json!({
                    "id": "6f8a80d14311c39f35f516fa664deaaaa13e85b2f7493f37f6144d86991ec012",
                    "name": "Geth/v1.13.14-stable/linux-amd64/go1.21.7",
                    "ports": {"discovery": 30303, "listener": 30303},
                });
                if let Some(enode) = self.enode.lock().clone() {
                    info["enode"] = Value::String(enode);
                }
                RpcResponse::success(request.id, info)
            }
            ADD_PEER_METHOD => {
                let peer = request
                    .params
                    .first()
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if self.failing.lock().contains(peer) {
                    RpcResponse::failure(request.id, RpcErrorObject::new(-32000, "invalid enode"))
                } else {
                    let refused = self.refused.lock().contains(peer);
                    RpcResponse::success(request.id, Value::Bool(!refused))
                }
            }
            other => RpcResponse::failure(
                request.id,
                RpcErrorObject::new(-32601, format!("the method {other} does not exist")),
            ),
        }
    }
}

/// Registry served by axum on an ephemeral local port.
pub struct FakeRegistry {
    addr: SocketAddr,
    state: Arc<RegistryState>,
}

#[derive(Default)]
pub struct RegistryState {
    /// `(authorization header, body)` of every publish call.
    pub published: Mutex<Vec<(Option<String>, Value)>>,
    pub peers: Mutex<Value>,
    /// When set, both endpoints answer with this status.
    pub failure: Mutex<Option<StatusCode>>,
    pub fetches: Mutex<usize>,
}

impl FakeRegistry {
    pub async fn spawn(peers: Value) -> Self {
        let state = Arc::new(RegistryState::default());
        *state.peers.lock() = peers;
        let router = Router::new()
            .route("/post-enode", post(handle_publish))
            .route("/get-enode", get(handle_fetch))
            .with_state(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind registry");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve registry");
        });
        Self { addr, state }
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    pub fn set_failure(&self, status: Option<StatusCode>) {
        *self.state.failure.lock() = status;
    }

    pub fn publish_url(&self) -> String {
        format!("http://{}/post-enode", self.addr)
    }

    pub fn fetch_url(&self) -> String {
        format!("http://{}/get-enode", self.addr)
    }

    pub fn client(&self) -> RegistryClient {
        let mut config = RegistryConfig::new(
            self.publish_url(),
            self.fetch_url(),
            Credential::new(TOKEN).expect("credential"),
        );
        config.request_timeout = Some(Duration::from_secs(5));
        RegistryClient::new(config).expect("registry client")
    }
}

async fn handle_publish(
    State(state): State<Arc<RegistryState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    state.published.lock().push((auth, body));
    match *state.failure.lock() {
        Some(status) => (status, Json(json!({"error": "unavailable"}))),
        None => (StatusCode::OK, Json(json!({"message": "Enode stored"}))),
    }
}

async fn handle_fetch(State(state): State<Arc<RegistryState>>) -> impl IntoResponse {
    *state.fetches.lock() += 1;
    match *state.failure.lock() {
        Some(status) => (status, Json(json!({"error": "unavailable"}))),
        None => (StatusCode::OK, Json(state.peers.lock().clone())),
    }
}

/// Polls `condition` until it holds or the wait times out.
pub async fn wait_for<F>(mut condition: F, what: &str)
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
