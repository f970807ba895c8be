use std::sync::Arc;
use std::time::Duration;

use ipc::IpcClient;
use registry::{PublishAck, RegistryClient};
use tracing::info;

use crate::error::SyncError;
use crate::identity::IdentityResolver;
use crate::reconcile::{PeerReconciler, ReconcileReport};
use crate::scheduler::{PeriodicTask, Scheduler};

pub const PUBLISH_TASK: &str = "publish";
pub const RECONCILE_TASK: &str = "reconcile";

/// Everything a publish or reconcile run needs.
#[derive(Clone, Debug)]
pub struct SyncContext {
    identity: IdentityResolver,
    registry: RegistryClient,
    reconciler: PeerReconciler,
}

impl SyncContext {
    pub fn new(ipc: IpcClient, registry: RegistryClient) -> Self {
        Self {
            identity: IdentityResolver::new(ipc.clone()),
            registry,
            reconciler: PeerReconciler::new(ipc),
        }
    }

    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    pub fn registry(&self) -> &RegistryClient {
        &self.registry
    }

    /// Resolves our enode and announces it to the registry.
    pub async fn publish_once(&self) -> Result<PublishAck, SyncError> {
        let identity = self.identity.resolve_own_identity().await?;
        let ack = self.registry.publish(&identity).await?;
        info!(enode = %identity, status = %ack.status, "published own enode");
        Ok(ack)
    }

    /// Pulls the registry's peer set and asks the node to add each peer.
    pub async fn reconcile_once(&self) -> Result<ReconcileReport, SyncError> {
        let peers = self.registry.fetch_peers().await?;
        let own = self.identity.resolve_own_identity().await?;
        let report = self.reconciler.reconcile(&peers, &own).await;
        info!(
            listed = peers.len(),
            added = report.added_count(),
            failed = report.failures.len(),
            "reconciled registry peers"
        );
        Ok(report)
    }
}

/// Schedules the publish and reconcile tasks on their own periods.
pub fn spawn_sync_tasks(
    ctx: Arc<SyncContext>,
    publish_interval: Duration,
    reconcile_interval: Duration,
) -> Scheduler {
    let mut scheduler = Scheduler::new();

    let publish_ctx = Arc::clone(&ctx);
    scheduler.spawn(PeriodicTask::new(PUBLISH_TASK, publish_interval, move || {
        let ctx = Arc::clone(&publish_ctx);
        async move { ctx.publish_once().await.map(|_| ()) }
    }));

    scheduler.spawn(PeriodicTask::new(
        RECONCILE_TASK,
        reconcile_interval,
        move || {
            let ctx = Arc::clone(&ctx);
            async move { ctx.reconcile_once().await.map(|_| ()) }
        },
    ));

    scheduler
}
