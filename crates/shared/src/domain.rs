use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TalkId(pub String);

impl TalkId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for TalkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Random token identifying the process that authored a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub Uuid);

impl ClientId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A comment attached to a talk, in the shape shared by the backend and the
/// local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub talk_id: TalkId,
    pub text: String,
    /// `None` when the stored record carries no usable UUID.
    #[serde(default, deserialize_with = "lenient_client_id")]
    pub client_id: Option<ClientId>,
    /// Client clock, milliseconds since the Unix epoch.
    #[serde(default, deserialize_with = "lenient_millis")]
    pub created_at: i64,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl Comment {
    pub fn new(
        talk_id: TalkId,
        text: impl Into<String>,
        client_id: ClientId,
        created_by: Option<String>,
    ) -> Self {
        Self {
            id: None,
            talk_id,
            text: text.into(),
            client_id: Some(client_id),
            created_at: Utc::now().timestamp_millis(),
            created_by,
        }
    }
}

fn lenient_client_id<'de, D>(deserializer: D) -> Result<Option<ClientId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .map(ClientId))
}

/// Accepts epoch millis as a number, a numeric string or an RFC 3339
/// timestamp. Anything else reads as 0 and sorts oldest.
fn lenient_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_millis).unwrap_or_default())
}

fn parse_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|millis| millis as i64)),
        Value::String(raw) => {
            let raw = raw.trim();
            raw.parse::<i64>().ok().or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|parsed| parsed.timestamp_millis())
            })
        }
        _ => None,
    }
}

/// Who is commenting from this process. Built once at startup and passed to
/// every thread instead of living in globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub client_id: ClientId,
    pub username: Option<String>,
}

impl Identity {
    pub fn new(username: Option<String>) -> Self {
        Self {
            client_id: ClientId::generate(),
            username,
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
