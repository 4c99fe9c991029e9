use std::path::Path;

use serde::Serialize;
use touchline_core::clock::{self, format_clock, format_playtime};
use touchline_core::config::ClientConfig;
use touchline_core::ledger;
use touchline_core::services::{LocalStore, MatchService};
use touchline_core::state::{Notice, NoticeLevel};
use touchline_core::summary::MatchSummary;
use touchline_core::sync::{HttpRemoteStore, SyncEngine};
use touchline_core::{Match, MatchId, MatchPhase, PlayerId, Roster};

use crate::error::CliError;

/// Everything a command needs: the durable match service plus config.
#[derive(Clone)]
pub struct Session {
    pub service: MatchService,
    pub config: ClientConfig,
    pub roster: Roster,
}

pub async fn open_session(db_path: &Path, config: ClientConfig) -> Result<Session, CliError> {
    let roster = config.roster().map_err(CliError::Config)?;
    let store = LocalStore::open_path(db_path.to_path_buf()).await?;
    let service = MatchService::load(store, roster.clone(), config.engine_config()).await?;
    Ok(Session {
        service,
        config,
        roster,
    })
}

pub fn sync_engine(session: &Session) -> Result<SyncEngine<HttpRemoteStore>, CliError> {
    let endpoint = session
        .config
        .sync_endpoint()
        .ok_or(CliError::SyncNotConfigured)?;
    let remote = HttpRemoteStore::new(endpoint)?;
    Ok(SyncEngine::new(remote, session.service.clone()))
}

pub fn now_ms() -> i64 {
    touchline_core::util::now_ms()
}

pub fn resolve_player(roster: &Roster, query: &str) -> Result<PlayerId, CliError> {
    roster
        .resolve(query)
        .map(|player| player.id.clone())
        .ok_or_else(|| CliError::UnknownPlayer(query.trim().to_string()))
}

/// Resolve an archived match by full id or unique prefix.
pub fn resolve_history_match(history: &[Match], query: &str) -> Result<MatchId, CliError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CliError::MatchNotFound(query.to_string()));
    }
    if let Ok(id) = query.parse::<MatchId>() {
        if history.iter().any(|game| game.id == id) {
            return Ok(id);
        }
    }

    let matching = history
        .iter()
        .filter(|game| game.id.to_string().starts_with(query))
        .map(|game| game.id)
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::MatchNotFound(query.to_string())),
        [id] => Ok(*id),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|id| id.to_string().chars().take(13).collect::<String>())
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousMatchId(format!(
                "Match id prefix '{query}' is ambiguous. Matches: {options}"
            )))
        }
    }
}

pub fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => println!("{}", notice.message),
        NoticeLevel::Warning | NoticeLevel::Error => eprintln!("{}", notice.message),
    }
}

pub fn phase_label(phase: MatchPhase) -> &'static str {
    match phase {
        MatchPhase::NoActiveMatch => "no active match",
        MatchPhase::Running => "running",
        MatchPhase::Paused => "paused",
        MatchPhase::Finished => "finished",
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatusItem {
    pub id: String,
    pub name: String,
    pub on_field: bool,
    pub tackles: u32,
    pub playtime_seconds: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusItem {
    pub phase: &'static str,
    pub match_id: String,
    pub team_name: String,
    pub opponent_name: String,
    pub is_home: bool,
    pub our_score: u32,
    pub opponent_score: u32,
    pub elapsed_ms: i64,
    pub clock: String,
    pub top_tackler: String,
    pub players: Vec<PlayerStatusItem>,
}

pub fn status_item(
    game: &Match,
    phase: MatchPhase,
    roster: &Roster,
    team_name: &str,
    now_ms: i64,
) -> StatusItem {
    let elapsed_ms = clock::elapsed_ms(game, now_ms);
    let players = roster
        .players()
        .iter()
        .map(|player| PlayerStatusItem {
            id: player.id.to_string(),
            name: player.name.clone(),
            on_field: game
                .player_sessions
                .get(&player.id)
                .is_some_and(|session| session.on_field),
            tackles: game.tackle_counts.get(&player.id).copied().unwrap_or(0),
            playtime_seconds: ledger::playtime_seconds(game, &player.id, now_ms),
        })
        .collect();

    StatusItem {
        phase: phase_label(phase),
        match_id: game.id.to_string(),
        team_name: team_name.to_string(),
        opponent_name: game.opponent_name.clone(),
        is_home: game.is_home,
        our_score: ledger::total_score(game),
        opponent_score: game.opponent_score,
        elapsed_ms,
        clock: format_clock(elapsed_ms),
        top_tackler: ledger::top_tackler_label(&game.tackle_counts, roster),
        players,
    }
}

pub fn format_status_lines(status: &StatusItem) -> Vec<String> {
    let (home, home_score, away, away_score) = if status.is_home {
        (
            status.team_name.as_str(),
            status.our_score,
            status.opponent_name.as_str(),
            status.opponent_score,
        )
    } else {
        (
            status.opponent_name.as_str(),
            status.opponent_score,
            status.team_name.as_str(),
            status.our_score,
        )
    };

    let mut lines = vec![
        format!("{home} {home_score} - {away_score} {away}"),
        format!("{}  ({})", status.clock, status.phase),
        format!("Top tackler: {}", status.top_tackler),
    ];
    for player in &status.players {
        lines.push(format!(
            "  {:<4} {:<10} {:<3} tackles {:>2}  {}",
            player.id,
            player.name,
            if player.on_field { "ON" } else { "OFF" },
            player.tackles,
            format_playtime(player.playtime_seconds)
        ));
    }
    lines
}

pub fn format_log_lines(game: &Match) -> Vec<String> {
    let mut lines = vec!["Scores:".to_string()];
    let scores = game.score_history();
    if scores.is_empty() {
        lines.push("  (none)".to_string());
    }
    for entry in scores {
        lines.push(format!(
            "  {}  {:<10} {:<10} {}",
            entry.wall_clock_label, entry.name, entry.label, entry.id
        ));
    }

    lines.push("Substitutions:".to_string());
    if game.sub_history.is_empty() {
        lines.push("  (none)".to_string());
    }
    for entry in &game.sub_history {
        lines.push(format!(
            "  {}  {:<10} {}",
            entry.wall_clock_label, entry.name, entry.direction
        ));
    }

    lines.push("Tackles:".to_string());
    if game.tackle_history.is_empty() {
        lines.push("  (none)".to_string());
    }
    for entry in &game.tackle_history {
        lines.push(format!("  {}  {}", entry.wall_clock_label, entry.name));
    }
    lines
}

pub fn format_history_line(summary: &MatchSummary, team_name: &str) -> String {
    let id_prefix = summary.id.to_string().chars().take(13).collect::<String>();
    let mut line = format!(
        "{id_prefix}  {}  {}  {}  top tackler: {}",
        summary.scoreline(team_name),
        summary.result,
        summary.duration,
        summary.top_tackler
    );
    if !summary.comments.trim().is_empty() {
        line.push_str("  \"");
        line.push_str(summary.comments.trim());
        line.push('"');
    }
    line
}
