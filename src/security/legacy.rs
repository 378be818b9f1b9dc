//! Checksum used by the first generation of clients to store passwords.
//!
//! It is deterministic and cheap to reverse by brute force over the 4-6 digit
//! password space. New passwords are never stored with it unless the
//! deployment explicitly selects the legacy scheme.

const SALT_PREFIX: &str = "BT_SECURE_2024_v1_";
const SALT_SUFFIX: &str = "_ROBLOX_BETA_SYSTEM";

/// Two-pass additive/rotate checksum rendered in base 36.
///
/// The first pass keeps the accumulator in 32-bit two's complement. The
/// second pass runs over the base-36 text of the first result and only
/// truncates the shifted operand, so the accumulator is widened to `i64`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn legacy_hash(password: &str) -> String {
    let salted = format!("{SALT_PREFIX}{password}{SALT_SUFFIX}");

    let mut hash: i32 = 0;
    for unit in salted.encode_utf16() {
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit));
    }

    let first_pass = to_base36(i64::from(hash).unsigned_abs());

    let mut hash = i64::from(hash);
    for unit in first_pass.encode_utf16() {
        let shifted = i64::from((hash as i32) << 3);
        hash = shifted - hash + i64::from(unit);
    }

    to_base36(hash.unsigned_abs())
}

/// Returns true when `stored` looks like output of [`legacy_hash`].
#[must_use]
pub fn is_legacy_hash(stored: &str) -> bool {
    !stored.is_empty()
        && stored.len() <= 13
        && stored
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();

    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(legacy_hash("1234"), "1cogiwh");
        assert_eq!(legacy_hash("5678"), "8pirq");
        assert_eq!(legacy_hash("0000"), "e187l3");
        assert_eq!(legacy_hash("123456"), "1v991ub");
        assert_eq!(legacy_hash(""), "s5h4hy");
        assert_eq!(legacy_hash("ñ"), "1h62oit");
    }

    #[test]
    fn test_deterministic_for_every_four_digit_password() {
        for n in 0..10_000 {
            let password = format!("{n:04}");
            assert_eq!(legacy_hash(&password), legacy_hash(&password));
        }
    }

    #[test]
    fn test_distinct_inputs_differ() {
        assert_ne!(legacy_hash("1234"), legacy_hash("5678"));
    }

    #[test]
    fn test_is_legacy_hash() {
        assert!(is_legacy_hash(&legacy_hash("4321")));
        assert!(!is_legacy_hash("$argon2id$v=19$m=8192,t=3,p=1$abc$def"));
        assert!(!is_legacy_hash(""));
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
