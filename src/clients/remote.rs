use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid remote URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Remote store is offline")]
    Offline,
}

/// A value observed at a watched path.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteChange {
    pub path: String,
    pub value: Value,
}

/// Realtime document store addressed by top-level path.
///
/// `get` returns `Ok(None)` when nothing is stored at the path.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Value>, RemoteError>;

    async fn set(&self, path: &str, value: &Value) -> Result<(), RemoteError>;

    /// Subscribes to value changes at `paths`. The current value of each path
    /// is delivered once the watch starts, then again whenever it changes.
    fn watch(&self, paths: &[&str]) -> broadcast::Receiver<RemoteChange>;

    fn name(&self) -> &'static str;
}
