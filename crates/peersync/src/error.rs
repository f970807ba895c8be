use ipc::IpcError;
use registry::{PeerAddress, RegistryError};
use thiserror::Error;

/// The node could not tell us how it is reachable.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("node info request failed: {0}")]
    Call(#[from] IpcError),
    #[error("node info has no usable `{field}` field")]
    MissingField { field: &'static str },
}

#[derive(Debug, Error)]
pub enum PeerAddCause {
    #[error(transparent)]
    Call(#[from] IpcError),
    #[error("node refused the peer")]
    Rejected,
}

/// Failure to add one specific peer. Never aborts a reconciliation pass.
#[derive(Debug, Error)]
#[error("failed to add peer {peer}: {cause}")]
pub struct PeerAddError {
    pub peer: PeerAddress,
    #[source]
    pub cause: PeerAddCause,
}

/// Error returned by a publish or reconcile run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("node identity unavailable: {0}")]
    IdentityUnavailable(#[from] IdentityError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
