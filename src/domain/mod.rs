//! Domain types shared across services.

pub mod events;

pub use events::{ChangeSource, DeskEvent};
