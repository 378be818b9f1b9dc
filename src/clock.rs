//! Timestamps and record ids.

use crate::constants::DISPLAY_TIMESTAMP_FORMAT;

/// Local wall-clock time in the display format stored on records.
#[must_use]
pub fn display_timestamp() -> String {
    chrono::Local::now()
        .format(DISPLAY_TIMESTAMP_FORMAT)
        .to_string()
}

#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Creation-time id that stays unique when two records land in the same millisecond.
#[must_use]
pub fn next_id(existing: impl IntoIterator<Item = i64>) -> i64 {
    let now = now_millis();
    existing
        .into_iter()
        .max()
        .map_or(now, |max| now.max(max + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_id_is_strictly_increasing() {
        let far_future = now_millis() + 60_000;
        assert_eq!(next_id([far_future]), far_future + 1);

        let first = next_id([]);
        assert!(next_id([first]) > first);
    }

    #[test]
    fn test_display_timestamp_shape() {
        let ts = display_timestamp();
        assert!(ts.contains(", "));
        assert_eq!(ts.matches('/').count(), 2);
        assert_eq!(ts.matches(':').count(), 2);
    }
}
