//! View-models built from whole collections. Pure functions: the API only
//! serializes what these return.

pub mod accounts;
pub mod dashboard;
pub mod game;
pub mod inbox;
pub mod requests;

pub use accounts::{AccountCard, PasswordDisplay, ProfileView};
pub use dashboard::DashboardView;
pub use game::GameView;
pub use inbox::InboxView;
pub use requests::{RequestBoard, RequestCard};
