use touchline_core::summary::MatchSummary;

use crate::commands::common::{format_history_line, now_ms, resolve_history_match, Session};
use crate::error::CliError;

pub async fn history_summaries(session: &Session) -> Vec<MatchSummary> {
    let roster = session.roster.clone();
    let now = now_ms();
    session
        .service
        .read(|engine| {
            engine
                .history()
                .iter()
                .map(|game| MatchSummary::of(game, &roster, now))
                .collect()
        })
        .await
}

pub async fn run_history_list(session: &Session, as_json: bool) -> Result<(), CliError> {
    let summaries = history_summaries(session).await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No archived matches.");
        return Ok(());
    }
    for summary in &summaries {
        println!("{}", format_history_line(summary, &session.config.team_name));
    }
    Ok(())
}

pub async fn run_history_comment(
    session: &Session,
    id: &str,
    text: &[String],
) -> Result<(), CliError> {
    let comment = text.join(" ").trim().to_string();
    let history = session.service.read(|engine| engine.history().to_vec()).await;
    let match_id = resolve_history_match(&history, id)?;

    session
        .service
        .apply(|engine| engine.edit_history_comment(&match_id, comment))
        .await?;
    println!("Updated comment for {match_id}");
    Ok(())
}

pub async fn run_history_delete(session: &Session, id: &str) -> Result<(), CliError> {
    let history = session.service.read(|engine| engine.history().to_vec()).await;
    let match_id = resolve_history_match(&history, id)?;

    let removed = session
        .service
        .apply(|engine| engine.delete_history_match(&match_id))
        .await?;
    println!("Deleted match against {} ({match_id})", removed.opponent_name);
    Ok(())
}
