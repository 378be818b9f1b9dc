use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

use super::remote::{RemoteChange, RemoteError, RemoteStore};

const WATCH_CHANNEL_CAPACITY: usize = 64;

/// Client for a realtime-database REST endpoint.
///
/// Every path maps to `{base_url}/{path}.json`; `null` bodies mean the path
/// is empty. Change notification is done by polling.
#[derive(Debug, Clone)]
pub struct FirebaseClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    poll_interval: Duration,
}

impl FirebaseClient {
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("BetaDesk/1.0")
            .build()?;

        Ok(Self::with_shared_client(
            client,
            base_url,
            auth_token,
            poll_interval,
        ))
    }

    #[must_use]
    pub fn with_shared_client(
        client: Client,
        base_url: &str,
        auth_token: Option<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.filter(|t| !t.is_empty()),
            poll_interval,
        }
    }

    fn path_url(&self, path: &str) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&format!(
            "{}/{}.json",
            self.base_url,
            path.trim_matches('/')
        ))?;

        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }

        Ok(url)
    }

    async fn poll_paths(
        &self,
        paths: &[String],
        last_seen: &mut HashMap<String, Value>,
        tx: &broadcast::Sender<RemoteChange>,
    ) {
        for path in paths {
            match self.get(path).await {
                Ok(value) => {
                    let value = value.unwrap_or(Value::Null);
                    if last_seen.get(path) != Some(&value) {
                        last_seen.insert(path.clone(), value.clone());
                        let _ = tx.send(RemoteChange {
                            path: path.clone(),
                            value,
                        });
                    }
                }
                Err(e) => {
                    debug!(path = %path, error = %e, "Remote poll failed");
                }
            }
        }
    }
}

#[async_trait]
impl RemoteStore for FirebaseClient {
    async fn get(&self, path: &str) -> Result<Option<Value>, RemoteError> {
        let url = self.path_url(path)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = response.json().await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn set(&self, path: &str, value: &Value) -> Result<(), RemoteError> {
        let url = self.path_url(path)?;
        let response = self.client.put(url).json(value).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(path, status = status.as_u16(), "Remote write rejected");
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    fn watch(&self, paths: &[&str]) -> broadcast::Receiver<RemoteChange> {
        let (tx, rx) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        let paths: Vec<String> = paths.iter().map(ToString::to_string).collect();
        let client = self.clone();

        tokio::spawn(async move {
            let mut last_seen = HashMap::new();
            let mut ticker = tokio::time::interval(client.poll_interval);

            loop {
                ticker.tick().await;
                if tx.receiver_count() == 0 {
                    debug!("Remote watch has no subscribers, stopping");
                    break;
                }
                client.poll_paths(&paths, &mut last_seen, &tx).await;
            }
        });

        rx
    }

    fn name(&self) -> &'static str {
        "firebase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(token: Option<&str>) -> FirebaseClient {
        FirebaseClient::new(
            "https://beta-desk.example.firebaseio.com/",
            token.map(ToString::to_string),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_path_url_without_token() {
        let url = client(None).path_url("users").unwrap();
        assert_eq!(
            url.as_str(),
            "https://beta-desk.example.firebaseio.com/users.json"
        );
    }

    #[test]
    fn test_path_url_appends_auth() {
        let url = client(Some("s3cr3t")).path_url("/accountRequests/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://beta-desk.example.firebaseio.com/accountRequests.json?auth=s3cr3t"
        );
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let url = client(Some("")).path_url("logs").unwrap();
        assert!(url.query().is_none());
    }
}
