use touchline_core::state::Notice;
use touchline_core::Versionstamp;

use crate::commands::common::{now_ms, print_notice, sync_engine, Session};
use crate::error::CliError;

pub async fn run_pull(session: &Session) -> Result<Versionstamp, CliError> {
    let engine = sync_engine(session)?;
    let result = engine.pull().await;
    tracing::debug!(state = ?engine.state(), "Sync pull finished");
    let versionstamp = result.inspect_err(|error| {
        print_notice(&Notice::from_error(error, now_ms()));
    })?;
    print_notice(&Notice::success("Sync'd up!", now_ms()));
    Ok(versionstamp)
}

pub async fn run_push(session: &Session) -> Result<Versionstamp, CliError> {
    let engine = sync_engine(session)?;
    let result = engine.push().await;
    tracing::debug!(state = ?engine.state(), "Sync push finished");
    let versionstamp = result.inspect_err(|error| {
        print_notice(&Notice::from_error(error, now_ms()));
    })?;
    print_notice(&Notice::success("Sync sent and saved", now_ms()));
    Ok(versionstamp)
}

pub async fn run_token_set(session: &Session, token: &str) -> Result<(), CliError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CliError::EmptyToken);
    }
    session.service.store().save_token(Some(token)).await?;
    println!("API key saved");
    Ok(())
}

pub async fn run_token_clear(session: &Session) -> Result<(), CliError> {
    session.service.store().save_token(None).await?;
    println!("API key cleared");
    Ok(())
}

pub async fn run_token_status(session: &Session) -> Result<(), CliError> {
    let store = session.service.store();
    let has_token = store.load_token().await?.is_some();
    let versionstamp = store.load_versionstamp().await?;

    println!("API key: {}", if has_token { "set" } else { "not set" });
    if versionstamp.is_unsynced() {
        println!("Never synced");
    } else {
        println!("Last versionstamp: {versionstamp}");
    }
    match session.config.sync_endpoint() {
        Some(endpoint) => println!("Endpoint: {endpoint}"),
        None => println!("Endpoint: not configured"),
    }
    Ok(())
}
