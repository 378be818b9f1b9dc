use serde::{Deserialize, Serialize};

pub const SEVERITIES: &[&str] = &["low", "medium", "high", "critical"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BugStatus {
    #[default]
    Open,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugReport {
    pub id: i64,
    #[serde(rename = "user")]
    pub author: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub steps: String,
    pub timestamp: String,
    #[serde(default)]
    pub status: BugStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: i64,
    #[serde(rename = "user")]
    pub author: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub timestamp: String,
    #[serde(default)]
    pub status: SuggestionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_status_defaults() {
        let bug: BugReport = serde_json::from_str(
            r#"{"id":1,"user":"ana","severity":"high","title":"Crash","description":"On spawn","timestamp":"1/1/2026, 10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(bug.status, BugStatus::Open);
        assert_eq!(bug.author, "ana");
        assert!(bug.steps.is_empty());

        let suggestion: Suggestion = serde_json::from_str(
            r#"{"id":2,"user":"ana","category":"gameplay","title":"Sprint","description":"Add sprint","timestamp":"1/1/2026, 10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(suggestion.status, SuggestionStatus::Pending);
    }
}
