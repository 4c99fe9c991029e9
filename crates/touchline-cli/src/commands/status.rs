use std::time::Duration;

use touchline_core::services::MatchService;
use touchline_core::MatchPhase;

use crate::commands::common::{
    format_log_lines, format_status_lines, now_ms, phase_label, status_item, Session, StatusItem,
};
use crate::error::CliError;

pub async fn current_status(session: &Session, now: i64) -> Option<StatusItem> {
    let roster = session.roster.clone();
    let team_name = session.config.team_name.clone();
    session
        .service
        .read(|engine| {
            engine
                .active_match()
                .map(|game| status_item(game, engine.phase(), &roster, &team_name, now))
        })
        .await
}

pub async fn run_status(session: &Session, as_json: bool, watch: bool) -> Result<(), CliError> {
    if watch {
        return run_watch(session).await;
    }

    let status = current_status(session, now_ms()).await;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    match status {
        Some(status) => {
            for line in format_status_lines(&status) {
                println!("{line}");
            }
        }
        None => println!("No active match. Start one with `touchline start <opponent>`."),
    }
    Ok(())
}

/// Reload persisted state so commands run from other shells show up.
async fn reload(session: &Session) -> Result<Session, CliError> {
    let service = MatchService::load(
        session.service.store().clone(),
        session.roster.clone(),
        session.config.engine_config(),
    )
    .await?;
    Ok(Session {
        service,
        ..session.clone()
    })
}

/// Redraw the clock once per second. The tick only reads state.
async fn run_watch(session: &Session) -> Result<(), CliError> {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let current = reload(session).await?;
                let Some(status) = current_status(&current, now_ms()).await else {
                    println!("No active match.");
                    return Ok(());
                };
                println!("{}", format_status_lines(&status).join("\n"));
                println!();
                if status.phase == phase_label(MatchPhase::Finished) {
                    return Ok(());
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                return Ok(());
            }
        }
    }
}

pub async fn run_log(session: &Session) -> Result<(), CliError> {
    let lines = session
        .service
        .read(|engine| engine.active_match().map(format_log_lines))
        .await;
    match lines {
        Some(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        None => println!("No active match."),
    }
    Ok(())
}
