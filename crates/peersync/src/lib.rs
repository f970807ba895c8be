pub mod cfg;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod reconcile;
pub mod scheduler;
pub mod tasks;

pub use cfg::SyncConfig;
pub use error::{IdentityError, PeerAddCause, PeerAddError, SyncError};
pub use identity::IdentityResolver;
pub use metrics::{TaskMetrics, TaskMetricsSnapshot};
pub use reconcile::{PeerReconciler, ReconcileReport};
pub use registry::{Enode, NodeIdentity, PeerAddress, PeerSet};
pub use scheduler::{PeriodicTask, Scheduler, TaskMonitor, TaskState};
pub use tasks::{PUBLISH_TASK, RECONCILE_TASK, SyncContext, spawn_sync_tasks};
