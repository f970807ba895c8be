//! Client for a node's local JSON-RPC control socket.
//!
//! Every call opens its own Unix socket connection, writes one
//! newline-terminated request, reads one newline-terminated response and
//! drops the connection. Transport failures and errors reported by the node
//! are kept apart so callers can tell "the node said no" from "we could not
//! talk to the node".

mod client;
mod codec;
mod config;
mod error;
mod types;

pub use client::{ADD_PEER_METHOD, IpcClient, NODE_INFO_METHOD};
pub use codec::{read_response, write_request};
pub use config::IpcConfig;
pub use error::{IpcError, TransportError};
pub use types::{JSONRPC_VERSION, RpcErrorObject, RpcRequest, RpcResponse};
