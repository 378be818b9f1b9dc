use serde::Serialize;
use std::collections::HashMap;

use super::Collection;

/// Outcome of the most recent remote calls for one collection.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub last_success_at: Option<String>,
    pub last_error: Option<String>,
    pub last_error_at: Option<String>,
    pub failures: u64,
}

impl SyncState {
    /// True when the latest remote call failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        match (&self.last_error_at, &self.last_success_at) {
            (Some(_), None) => true,
            (Some(err), Some(ok)) => err >= ok,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSync {
    pub collection: Collection,
    #[serde(flatten)]
    pub state: SyncState,
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub remote_enabled: bool,
    pub remote: Option<&'static str>,
    pub read_policy: crate::config::ReadPolicy,
    pub collections: Vec<CollectionSync>,
}

#[derive(Debug, Default)]
pub(super) struct SyncLedger {
    states: HashMap<Collection, SyncState>,
}

impl SyncLedger {
    pub(super) fn success(&mut self, collection: Collection) {
        self.states.entry(collection).or_default().last_success_at = Some(now_rfc3339());
    }

    pub(super) fn failure(&mut self, collection: Collection, error: &str) {
        let state = self.states.entry(collection).or_default();
        state.last_error = Some(error.to_string());
        state.last_error_at = Some(now_rfc3339());
        state.failures += 1;
    }

    pub(super) fn snapshot(&self) -> Vec<CollectionSync> {
        Collection::ALL
            .into_iter()
            .map(|collection| {
                let state = self.states.get(&collection).cloned().unwrap_or_default();
                CollectionSync {
                    collection,
                    degraded: state.is_degraded(),
                    state,
                }
            })
            .collect()
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
