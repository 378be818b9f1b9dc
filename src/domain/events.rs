//! Domain events broadcast on the event bus.
//!
//! Listeners include the SSE stream and the activity of remote sync. Events
//! describe which collection changed, never its contents.

use serde::Serialize;

use crate::storage::Collection;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    /// Written by this process.
    Local,
    /// Pulled in from the remote replica.
    Remote,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum DeskEvent {
    CollectionChanged {
        collection: Collection,
        source: ChangeSource,
    },

    Info {
        message: String,
    },

    Error {
        message: String,
    },
}

impl DeskEvent {
    /// Whether a tester (non-admin) session may see this event.
    #[must_use]
    pub const fn visible_to_testers(&self) -> bool {
        match self {
            Self::CollectionChanged { collection, .. } => collection.visible_to_testers(),
            Self::Info { .. } | Self::Error { .. } => false,
        }
    }
}
