//! Password handling and the reversible encoding applied to stored blobs.
//!
//! Only [`password`] provides real protection (argon2id). The legacy
//! checksum and [`obfuscation`] exist to read and migrate data written by
//! older clients; neither offers confidentiality or collision resistance.

pub mod legacy;
pub mod obfuscation;
pub mod password;

pub use legacy::legacy_hash;
pub use obfuscation::{deobfuscate, obfuscate};
pub use password::{PasswordHasherConfig, PasswordPolicy, hash_password, verify_password};
