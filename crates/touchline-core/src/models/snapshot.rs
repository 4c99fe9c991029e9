//! Serializable snapshot exchanged during sync and export/import

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Match;
use crate::error::{Error, Result};

/// Remote-assigned version token. Opaque apart from equality.
///
/// Older endpoints hand out integers, key-value backends hand out
/// zero-padded strings; both compare by their textual form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Versionstamp {
    Number(u64),
    Text(String),
}

impl Versionstamp {
    /// The "never synced" stamp.
    pub const UNSYNCED: Self = Self::Number(0);

    pub fn is_unsynced(&self) -> bool {
        match self {
            Self::Number(value) => *value == 0,
            Self::Text(value) => value.trim().chars().all(|c| c == '0'),
        }
    }

    fn canonical(&self) -> Cow<'_, str> {
        match self {
            Self::Number(value) => Cow::Owned(value.to_string()),
            Self::Text(value) => Cow::Borrowed(value.trim()),
        }
    }
}

impl Default for Versionstamp {
    fn default() -> Self {
        Self::UNSYNCED
    }
}

impl PartialEq for Versionstamp {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Versionstamp {}

impl fmt::Display for Versionstamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Transient front-end flags that travel with the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiFlags {
    #[serde(default)]
    pub is_finish_modal_open: bool,
    #[serde(default)]
    pub post_game_comment: String,
    #[serde(default)]
    pub is_start_modal_open: bool,
    #[serde(default)]
    pub opponent_name_input: String,
}

/// Full local state: active match, history (newest first), and UI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    #[serde(flatten)]
    pub ui: UiFlags,
    #[serde(default, alias = "activeGame")]
    pub active_match: Option<Match>,
    #[serde(default, alias = "historicGames")]
    pub historic_matches: Vec<Match>,
}

impl SyncPayload {
    /// Parse an imported document: a bare payload, `{data}` or `{value: {data}}`.
    pub fn from_import_bytes(bytes: &[u8]) -> Result<Self> {
        let document: Value = serde_json::from_slice(bytes)
            .map_err(|error| Error::Parse(format!("not valid JSON: {error}")))?;
        let payload = unwrap_data(document)
            .ok_or_else(|| Error::Parse("document does not contain a payload".to_string()))?;
        payload_from_value(payload)
    }
}

/// `{versionstamp, payload}` as returned by the sync endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEnvelope {
    pub versionstamp: Versionstamp,
    pub payload: SyncPayload,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    versionstamp: Option<Versionstamp>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    value: Option<Value>,
}

impl SyncEnvelope {
    /// Parse a pull response body.
    pub fn from_json(body: &str) -> Result<Self> {
        let raw: RawEnvelope = serde_json::from_str(body)
            .map_err(|error| Error::Parse(format!("invalid sync response: {error}")))?;
        let versionstamp = raw
            .versionstamp
            .ok_or_else(|| Error::Parse("sync response has no versionstamp".to_string()))?;
        let data = raw
            .data
            .filter(|data| !data.is_null())
            .or_else(|| raw.value.and_then(unwrap_data))
            .ok_or_else(|| Error::Parse("sync response has no data".to_string()))?;

        Ok(Self {
            versionstamp,
            payload: payload_from_value(data)?,
        })
    }
}

fn unwrap_data(document: Value) -> Option<Value> {
    match document {
        Value::Object(mut map) => {
            if let Some(data) = map.remove("data").filter(Value::is_object) {
                return Some(data);
            }
            if let Some(value) = map.remove("value") {
                return unwrap_data(value);
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}

fn payload_from_value(value: Value) -> Result<SyncPayload> {
    serde_json::from_value(value).map_err(|error| Error::Parse(format!("invalid payload: {error}")))
}
