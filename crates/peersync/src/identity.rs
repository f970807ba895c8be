use ipc::IpcClient;
use registry::{Enode, NodeIdentity};
use serde_json::Value;
use tracing::debug;

use crate::error::IdentityError;

/// Field of the `admin_nodeInfo` result holding the node's own enode.
pub const ENODE_FIELD: &str = "enode";

/// Asks the node for its own enode. Never caches: the node may restart with
/// a different listening address between cycles.
#[derive(Clone, Debug)]
pub struct IdentityResolver {
    client: IpcClient,
}

impl IdentityResolver {
    pub fn new(client: IpcClient) -> Self {
        Self { client }
    }

    pub async fn resolve_own_identity(&self) -> Result<NodeIdentity, IdentityError> {
        let info = self.client.node_info().await?;
        let identity = extract_identity(&info)?;
        debug!(enode = %identity, "resolved own identity");
        Ok(identity)
    }
}

fn extract_identity(info: &Value) -> Result<NodeIdentity, IdentityError> {
    match info.get(ENODE_FIELD).and_then(Value::as_str) {
        Some(enode) if !enode.trim().is_empty() => Ok(Enode::from(enode)),
        _ => Err(IdentityError::MissingField { field: ENODE_FIELD }),
    }
}
