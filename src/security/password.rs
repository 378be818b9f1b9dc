use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use regex::Regex;
use std::sync::LazyLock;

use super::legacy::{is_legacy_hash, legacy_hash};
use crate::config::{PasswordScheme, SecurityConfig};

static FOUR_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("valid regex"));

static FOUR_TO_SIX_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4,6}$").expect("valid regex"));

/// Numeric PIN rules for account passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPolicy {
    /// Exactly four digits.
    Standard,
    /// Four to six digits, used by the primary admin.
    PrimaryAdmin,
}

impl PasswordPolicy {
    #[must_use]
    pub const fn for_account(is_primary_admin: bool) -> Self {
        if is_primary_admin {
            Self::PrimaryAdmin
        } else {
            Self::Standard
        }
    }

    #[must_use]
    pub fn accepts(self, password: &str) -> bool {
        match self {
            Self::Standard => FOUR_DIGITS.is_match(password),
            Self::PrimaryAdmin => FOUR_TO_SIX_DIGITS.is_match(password),
        }
    }

    #[must_use]
    pub const fn requirement(self) -> &'static str {
        match self {
            Self::Standard => "Password must be exactly 4 digits",
            Self::PrimaryAdmin => "Password must be 4 to 6 digits",
        }
    }
}

/// Parameters needed to produce a stored password hash.
#[derive(Debug, Clone)]
pub struct PasswordHasherConfig {
    pub scheme: PasswordScheme,
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl From<&SecurityConfig> for PasswordHasherConfig {
    fn from(config: &SecurityConfig) -> Self {
        Self {
            scheme: config.password_scheme,
            memory_cost_kib: config.argon2_memory_cost_kib,
            time_cost: config.argon2_time_cost,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// Hashes a password with the configured scheme.
/// Argon2 is CPU-intensive; async callers should run this in `spawn_blocking`.
pub fn hash_password(password: &str, config: &PasswordHasherConfig) -> Result<String> {
    match config.scheme {
        PasswordScheme::Legacy => Ok(legacy_hash(password)),
        PasswordScheme::Argon2 => {
            let salt = SaltString::generate(&mut OsRng);
            let params = Params::new(
                config.memory_cost_kib,
                config.time_cost,
                config.parallelism,
                None,
            )
            .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
            let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

            let hash = argon2
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

            Ok(hash.to_string())
        }
    }
}

/// Checks a password against a stored argon2 PHC string or legacy checksum.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored.starts_with("$argon2") {
        return PasswordHash::new(stored).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        });
    }

    is_legacy_hash(stored) && legacy_hash(password) == stored
}

/// True when a stored hash was not produced by `scheme` and should be rewritten.
#[must_use]
pub fn needs_rehash(stored: &str, scheme: PasswordScheme) -> bool {
    match scheme {
        PasswordScheme::Argon2 => !stored.starts_with("$argon2"),
        PasswordScheme::Legacy => false,
    }
}

/// Random four digit password, `1000..=9999`.
#[must_use]
pub fn generate_pin() -> String {
    use rand::Rng;

    rand::rng().random_range(1000..=9999).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config(scheme: PasswordScheme) -> PasswordHasherConfig {
        PasswordHasherConfig {
            scheme,
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_policy_standard() {
        let policy = PasswordPolicy::Standard;
        assert!(policy.accepts("0000"));
        assert!(policy.accepts("1234"));
        assert!(!policy.accepts("123"));
        assert!(!policy.accepts("12345"));
        assert!(!policy.accepts("12a4"));
        assert!(!policy.accepts(""));
        assert!(!policy.accepts("١٢٣٤"));
        assert!(!policy.accepts("１２３４"));
    }

    #[test]
    fn test_policy_primary_admin() {
        let policy = PasswordPolicy::for_account(true);
        assert!(policy.accepts("1234"));
        assert!(policy.accepts("12345"));
        assert!(policy.accepts("123456"));
        assert!(!policy.accepts("1234567"));
        assert!(!policy.accepts("abcd"));
        assert!(!policy.accepts("١٢٣٤٥"));
        assert!(!policy.accepts("１２３４５６"));
    }

    #[test]
    fn test_argon2_round_trip() {
        let hash = hash_password("1234", &fast_config(PasswordScheme::Argon2)).unwrap();
        assert!(hash.starts_with("$argon2id"));
        assert!(verify_password("1234", &hash));
        assert!(!verify_password("5678", &hash));
        assert!(!needs_rehash(&hash, PasswordScheme::Argon2));
    }

    #[test]
    fn test_legacy_hashes_still_verify() {
        let hash = hash_password("1234", &fast_config(PasswordScheme::Legacy)).unwrap();
        assert_eq!(hash, legacy_hash("1234"));
        assert!(verify_password("1234", &hash));
        assert!(!verify_password("1235", &hash));
        assert!(needs_rehash(&hash, PasswordScheme::Argon2));
        assert!(!needs_rehash(&hash, PasswordScheme::Legacy));
    }

    #[test]
    fn test_generate_pin_is_four_digits() {
        for _ in 0..100 {
            assert!(PasswordPolicy::Standard.accepts(&generate_pin()));
        }
    }
}
