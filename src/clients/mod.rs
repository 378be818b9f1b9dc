//! Remote replicas of the collection store.

pub mod firebase;
pub mod memory;
pub mod remote;

pub use firebase::FirebaseClient;
pub use memory::MemoryRemote;
pub use remote::{RemoteChange, RemoteError, RemoteStore};
