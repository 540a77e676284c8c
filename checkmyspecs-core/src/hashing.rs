//! Hashing - SHA-256 fingerprints for files and verdicts
//!
//! Files are identified in reports by content hash; verdicts hash their
//! canonical JSON so repeated checks can be compared cheaply.

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Value, to_string};

use crate::validation::Verdict;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Fingerprint of a verdict: equal verdicts hash equal, issue order included.
pub fn verdict_digest(verdict: &Verdict) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(verdict)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": 3});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_verdict_digest_tracks_issue_order() {
        let a = Verdict::fail("x", vec!["one".into(), "two".into()]);
        let b = Verdict::fail("x", vec!["two".into(), "one".into()]);
        assert_eq!(verdict_digest(&a).unwrap(), verdict_digest(&a.clone()).unwrap());
        assert_ne!(verdict_digest(&a).unwrap(), verdict_digest(&b).unwrap());
    }
}
