use ipc::IpcClient;
use registry::{NodeIdentity, PeerAddress, PeerSet};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{PeerAddCause, PeerAddError};

/// Outcome of one reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub added: Vec<PeerAddress>,
    pub failures: Vec<PeerAddError>,
    /// Whether the registry listed our own enode.
    pub self_listed: bool,
}

impl ReconcileReport {
    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    pub fn attempted(&self) -> usize {
        self.added.len() + self.failures.len()
    }
}

#[derive(Clone, Debug)]
pub struct PeerReconciler {
    client: IpcClient,
}

impl PeerReconciler {
    pub fn new(client: IpcClient) -> Self {
        Self { client }
    }

    /// Asks the node to add every peer in `peers` other than `own`.
    ///
    /// Peers are handled one at a time; a failure is recorded in the report
    /// and the pass moves on to the next peer.
    pub async fn reconcile(&self, peers: &PeerSet, own: &NodeIdentity) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for peer in peers {
            if peer == own {
                report.self_listed = true;
                continue;
            }
            match self.add_peer(peer).await {
                Ok(()) => {
                    info!(%peer, "added peer");
                    report.added.push(peer.clone());
                }
                Err(err) => {
                    warn!(peer = %err.peer, error = %err.cause, "failed to add peer");
                    report.failures.push(err);
                }
            }
        }
        debug!(
            added = report.added_count(),
            failed = report.failures.len(),
            self_listed = report.self_listed,
            "reconciliation pass complete"
        );
        report
    }

    async fn add_peer(&self, peer: &PeerAddress) -> Result<(), PeerAddError> {
        let cause = match self.client.add_peer(peer.as_str()).await {
            Ok(Value::Bool(false)) => PeerAddCause::Rejected,
            Ok(_) => return Ok(()),
            Err(err) => PeerAddCause::Call(err),
        };
        Err(PeerAddError {
            peer: peer.clone(),
            cause,
        })
    }
}
