use std::env;
use std::path::{Path, PathBuf};

use touchline_core::config::{parse_client_config, ClientConfig};

use crate::error::CliError;

const APP_DIR: &str = "touchline";
const CONFIG_FILE_NAME: &str = "config.json";
const DB_FILE_NAME: &str = "touchline.db";

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// Load config from an explicit path, or the default location when it
/// exists, then apply environment overrides.
pub fn load_config(explicit_path: Option<&Path>) -> Result<ClientConfig, CliError> {
    let config = match explicit_path {
        Some(path) => read_config_file(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => read_config_file(&path)?,
            _ => ClientConfig::default(),
        },
    };

    let config = config.with_sync_url(env::var("TOUCHLINE_SYNC_URL").ok());
    config.validate().map_err(CliError::Config)?;
    Ok(config)
}

pub fn read_config_file(path: &Path) -> Result<ClientConfig, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|error| {
        CliError::Config(format!("cannot read {}: {error}", path.display()))
    })?;
    parse_client_config(&raw).map_err(|error| CliError::Config(format!("{}: {error}", path.display())))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("TOUCHLINE_DB_PATH").map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join(DB_FILE_NAME))
        .ok_or_else(|| CliError::Config("failed to resolve CLI data directory".to_string()))
}
