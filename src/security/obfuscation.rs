//! Reversible text encoding for stored blobs: base64 applied twice over the
//! UTF-8 JSON text. Anyone holding the data can read it back.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Serialize, de::DeserializeOwned};

pub fn obfuscate<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(encode_text(&json))
}

/// Decodes a blob written by [`obfuscate`]. Malformed input yields `None`.
#[must_use]
pub fn deobfuscate<T: DeserializeOwned>(encoded: &str) -> Option<T> {
    let text = decode_text(encoded)?;
    serde_json::from_str(&text).ok()
}

#[must_use]
pub fn encode_text(text: &str) -> String {
    let inner = STANDARD.encode(text.as_bytes());
    STANDARD.encode(inner.as_bytes())
}

#[must_use]
pub fn decode_text(encoded: &str) -> Option<String> {
    let inner = STANDARD.decode(encoded.trim()).ok()?;
    let bytes = STANDARD.decode(inner).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        username: String,
        role: String,
    }

    #[test]
    fn test_round_trip_collection() {
        let records = vec![
            Record {
                username: "ana".to_string(),
                role: "user".to_string(),
            },
            Record {
                username: "Ñandú ✓".to_string(),
                role: "admin".to_string(),
            },
        ];

        let encoded = obfuscate(&records).unwrap();
        let decoded: Vec<Record> = deobfuscate(&encoded).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_round_trip_empty_collection() {
        let encoded = obfuscate(&Vec::<Record>::new()).unwrap();
        assert_eq!(encoded, "VzEwPQ==");
        let decoded: Vec<Record> = deobfuscate(&encoded).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_matches_blobs_written_by_older_clients() {
        let encoded = "VzNzaWRYTmxjbTVoYldVaU9pSmhibUVpTENKeWIyeGxJam9pZFhObGNpSjlYUT09";
        let decoded: Vec<Record> = deobfuscate(encoded).unwrap();
        assert_eq!(
            decoded,
            vec![Record {
                username: "ana".to_string(),
                role: "user".to_string(),
            }]
        );

        assert_eq!(obfuscate("ñ").unwrap(), "SXNPeElnPT0=");
    }

    #[test]
    fn test_malformed_input_yields_none() {
        assert!(deobfuscate::<Vec<Record>>("not base64 at all!").is_none());
        assert!(deobfuscate::<Vec<Record>>(&encode_text("{broken json")).is_none());
        assert!(deobfuscate::<Vec<Record>>("").is_none());
    }
}
