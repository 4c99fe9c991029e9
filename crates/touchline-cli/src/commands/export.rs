use std::path::{Path, PathBuf};

use chrono::Local;
use touchline_core::export::{export_payload, import_payload};
use touchline_core::state::Notice;

use crate::commands::common::{now_ms, print_notice, Session};
use crate::error::CliError;

/// Write the export. A directory (or no path) gets the suggested file name.
pub async fn run_export(session: &Session, output_path: Option<&Path>) -> Result<PathBuf, CliError> {
    let payload = session.service.snapshot().await;
    let file = export_payload(&payload, &session.config.export_prefix, &Local::now())?;

    let path = match output_path {
        Some(path) if path.is_dir() => path.join(&file.file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&file.file_name),
    };
    std::fs::write(&path, file.contents)?;
    println!("{}", path.display());
    Ok(path)
}

pub async fn run_import(session: &Session, path: &Path) -> Result<(), CliError> {
    let bytes = std::fs::read(path)?;
    let payload = import_payload(&session.service, &bytes).await.inspect_err(|error| {
        print_notice(&Notice::from_error(error, now_ms()));
    })?;

    print_notice(&Notice::success(
        format!(
            "Imported {} archived match(es){}",
            payload.historic_matches.len(),
            if payload.active_match.is_some() {
                " and the active match"
            } else {
                ""
            }
        ),
        now_ms(),
    ));
    Ok(())
}
