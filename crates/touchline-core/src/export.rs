//! Local-file export of the full match payload.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::error::Result;
use crate::models::SyncPayload;
use crate::services::MatchService;

const EXPORT_INDENT: &[u8] = b"    ";

/// Rendered export ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

/// Render the payload as JSON indented by four spaces.
pub fn render_payload(payload: &SyncPayload) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(EXPORT_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    payload.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// `<prefix>-YYYY-MM-DD:HH:MM:SS.json`
#[must_use]
pub fn suggested_export_file_name<Tz>(prefix: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{prefix}-{}.json", at.format("%Y-%m-%d:%H:%M:%S"))
}

pub fn export_payload<Tz>(payload: &SyncPayload, prefix: &str, at: &DateTime<Tz>) -> Result<ExportFile>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    Ok(ExportFile {
        file_name: suggested_export_file_name(prefix, at),
        contents: render_payload(payload)?,
    })
}

/// Parse an exported document and replace local state with it.
/// On any error local state is left untouched.
pub async fn import_payload(service: &MatchService, bytes: &[u8]) -> Result<SyncPayload> {
    let payload = SyncPayload::from_import_bytes(bytes)?;
    service.replace_state(payload.clone(), None).await?;
    tracing::info!(
        history = payload.historic_matches.len(),
        "Imported local state"
    );
    Ok(payload)
}
