use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the control-channel client.
#[derive(Clone, Debug)]
pub struct IpcConfig {
    /// Filesystem path of the node's IPC socket.
    pub path: PathBuf,
    /// Upper bound for one full call (connect, write, read). `None` waits forever.
    pub call_timeout: Option<Duration>,
    /// Maximum bytes accepted for a single response line.
    pub max_response_size: usize,
}

impl IpcConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("geth.ipc"),
            call_timeout: Some(Duration::from_secs(10)),
            max_response_size: 4 * 1024 * 1024,
        }
    }
}
