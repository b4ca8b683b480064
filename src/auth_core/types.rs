//! Token views shared by drivers and the coordinator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Marker produced in place of a segment whose bytes are not JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedToken {
    pub error: &'static str,
}

impl Default for MalformedToken {
    fn default() -> Self {
        Self { error: "Malformed token" }
    }
}

/// One decoded token segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Segment {
    Json(Value),
    Malformed(MalformedToken),
}

impl Segment {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Malformed(_) => None,
        }
    }

    /// Top-level field of a JSON object segment.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_json().and_then(|value| value.get(key))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

/// Header and payload of an id token. Signatures are never checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedToken {
    pub header: Segment,
    pub payload: Segment,
}

impl DecodedToken {
    pub fn nonce(&self) -> Option<&str> {
        self.payload.get_str("nonce")
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// The `exp` claim, if present and numeric.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.payload.get("exp").and_then(Value::as_i64)?;
        DateTime::<Utc>::from_timestamp(secs, 0)
    }

    /// Tokens without an `exp` claim never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}
