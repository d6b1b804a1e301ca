use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A JSON-RPC request id. Either variant round-trips untouched; the two are
/// never coerced into each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Integer(i64),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Integer(i) => write!(f, "{i}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        RequestId::Integer(value)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        RequestId::String(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integer_id_round_trips() {
        let id = RequestId::Integer(42);
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!(42));
        let back: RequestId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn string_id_round_trips() {
        let id = RequestId::String("abc-123".to_string());
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!("abc-123"));
        let back: RequestId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn numeric_string_stays_a_string() {
        // A JSON string never matches the Integer variant, even if its
        // contents look numeric.
        let id: RequestId = serde_json::from_value(serde_json::json!("007")).unwrap();
        assert_eq!(id, RequestId::String("007".to_string()));
    }
}
