//! Records persisted as whole collections.
//!
//! Field names serialize in camelCase so collections written by older
//! clients (and the remote store they share) load unchanged.

pub mod activity;
pub mod notification;
pub mod request;
pub mod status;
pub mod ticket;
pub mod user;

pub use activity::{LogCategory, LogEntry};
pub use notification::{Notification, NotificationKind};
pub use request::{AccountRequest, RequestStatus};
pub use status::{GameStatus, SiteStatus};
pub use ticket::{BugReport, BugStatus, Suggestion, SuggestionStatus};
pub use user::{Role, User};
