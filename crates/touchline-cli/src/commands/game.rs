use touchline_core::clock::format_clock;
use touchline_core::ledger::ScoreRemoval;
use touchline_core::summary::MatchSummary;
use touchline_core::{MatchPhase, ScoreType};

use crate::cli::Side;
use crate::commands::common::{now_ms, phase_label, resolve_player, Session};
use crate::error::CliError;

pub async fn run_start(
    session: &Session,
    opponent: Option<&str>,
    away: bool,
) -> Result<MatchPhase, CliError> {
    let now = now_ms();
    let opponent = opponent.unwrap_or_default();
    let phase = session
        .service
        .apply(|engine| engine.start_match(opponent, !away, now))
        .await?;
    let opponent_name = session
        .service
        .read(|engine| engine.active_match().map(|game| game.opponent_name.clone()))
        .await
        .unwrap_or_default();

    println!("Match against {opponent_name} started ({})", phase_label(phase));
    Ok(phase)
}

pub async fn run_score(
    session: &Session,
    player: &str,
    score_type: ScoreType,
) -> Result<(), CliError> {
    let player_id = resolve_player(&session.roster, player)?;
    let now = now_ms();
    let event = session
        .service
        .apply(|engine| engine.record_score(&player_id, score_type, now))
        .await?;

    println!(
        "{} {} (+{})",
        session.roster.name_of(&event.player_id),
        event.score_type.label(),
        event.points
    );
    Ok(())
}

pub async fn run_undo(session: &Session) -> Result<(), CliError> {
    match session.service.apply(|engine| engine.undo_last_score()).await? {
        Some(event) => println!(
            "Removed {} {} (-{})",
            session.roster.name_of(&event.player_id),
            event.score_type.label(),
            event.points
        ),
        None => println!("Nothing to undo"),
    }
    Ok(())
}

pub async fn run_remove_score(session: &Session, log_id: &str) -> Result<(), CliError> {
    let log_id = log_id.trim();
    let removal = session
        .service
        .apply(|engine| engine.remove_score(log_id))
        .await?;

    let event = removal.event();
    let note = match removal {
        ScoreRemoval::Exact(_) => "",
        ScoreRemoval::Approximate(_) => " (matched by type and player)",
    };
    println!(
        "Removed {} {} (-{}){note}",
        session.roster.name_of(&event.player_id),
        event.score_type.label(),
        event.points
    );
    Ok(())
}

pub async fn run_opponent_score(session: &Session, score_type: ScoreType) -> Result<(), CliError> {
    let total = session
        .service
        .apply(|engine| engine.record_opponent_score(score_type))
        .await?;
    println!("Opponent {} (+{}) -> {total}", score_type.label(), score_type.points());
    Ok(())
}

pub async fn run_opponent_undo(session: &Session) -> Result<(), CliError> {
    let total = session
        .service
        .apply(|engine| engine.undo_opponent_score())
        .await?;
    println!("Opponent score -> {total}");
    Ok(())
}

pub async fn run_tackle(session: &Session, player: &str) -> Result<(), CliError> {
    let player_id = resolve_player(&session.roster, player)?;
    let now = now_ms();
    let count = session
        .service
        .apply(|engine| engine.record_tackle(&player_id, now))
        .await?;
    println!("{} tackles: {count}", session.roster.name_of(&player_id));
    Ok(())
}

pub async fn run_sub(session: &Session, player: &str) -> Result<(), CliError> {
    let player_id = resolve_player(&session.roster, player)?;
    let now = now_ms();
    let direction = session
        .service
        .apply(|engine| engine.toggle_substitution(&player_id, now))
        .await?;
    println!("{} {direction}", session.roster.name_of(&player_id));
    Ok(())
}

pub async fn run_pause(session: &Session) -> Result<(), CliError> {
    let now = now_ms();
    session.service.apply(|engine| engine.pause(now)).await?;
    print_clock(session, now).await;
    Ok(())
}

pub async fn run_resume(session: &Session) -> Result<(), CliError> {
    let now = now_ms();
    session.service.apply(|engine| engine.resume(now)).await?;
    print_clock(session, now).await;
    Ok(())
}

async fn print_clock(session: &Session, now: i64) {
    let (phase, elapsed) = session
        .service
        .read(|engine| (engine.phase(), engine.elapsed_ms(now).unwrap_or(0)))
        .await;
    println!("{} ({})", format_clock(elapsed), phase_label(phase));
}

pub async fn run_side(session: &Session, side: Side) -> Result<(), CliError> {
    let is_home = side == Side::Home;
    session
        .service
        .apply(|engine| engine.set_home(is_home))
        .await?;
    println!("Playing {}", if is_home { "at home" } else { "away" });
    Ok(())
}

pub async fn run_finish(session: &Session) -> Result<MatchSummary, CliError> {
    let now = now_ms();
    let roster = session.roster.clone();
    let summary = session
        .service
        .apply(|engine| {
            engine
                .finish_match(now)
                .map(|game| MatchSummary::of(game, &roster, now))
        })
        .await?;

    println!("Full time: {}", summary.scoreline(&session.config.team_name));
    println!("Duration {}  top tackler: {}", summary.duration, summary.top_tackler);
    println!("Run `touchline archive --comment <text>` to file the match.");
    Ok(summary)
}

pub async fn run_dismiss(session: &Session) -> Result<(), CliError> {
    session
        .service
        .apply(|engine| {
            engine.dismiss_finish();
            Ok(())
        })
        .await?;
    println!("Confirmation closed; the match stays finished");
    Ok(())
}

pub async fn run_archive(session: &Session, comment: Option<String>) -> Result<(), CliError> {
    let game = session
        .service
        .apply(|engine| engine.archive_match(comment))
        .await?;
    println!("Archived match against {} ({})", game.opponent_name, game.id);
    Ok(())
}
