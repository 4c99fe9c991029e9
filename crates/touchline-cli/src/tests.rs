use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use pretty_assertions::assert_eq;
use touchline_core::config::ClientConfig;
use touchline_core::summary::{MatchResult, MatchSummary};
use touchline_core::{Match, MatchId, MatchPhase, Roster, ScoreType};

use crate::cli::CompletionShell;
use crate::commands::common::{
    format_history_line, format_log_lines, format_status_lines, now_ms, open_session,
    resolve_history_match, resolve_player, status_item, sync_engine,
};
use crate::commands::completions::run_completions;
use crate::commands::export::{run_export, run_import};
use crate::commands::game::{run_archive, run_finish, run_score, run_start, run_tackle, run_undo};
use crate::commands::history::{history_summaries, run_history_comment, run_history_delete};
use crate::commands::status::current_status;
use crate::commands::sync::{run_token_clear, run_token_set};
use crate::config::read_config_file;
use crate::error::CliError;

fn archived(id: &str, opponent: &str) -> Match {
    let mut game = Match::new(opponent, true, 0, true);
    game.id = id.parse::<MatchId>().unwrap();
    game.is_finished = true;
    game
}

#[test]
fn resolve_player_accepts_id_or_name() {
    let roster = Roster::default();
    assert_eq!(resolve_player(&roster, "p01").unwrap().as_str(), "p01");
    assert_eq!(resolve_player(&roster, " cory ").unwrap().as_str(), "p02");
    assert!(matches!(
        resolve_player(&roster, "nobody"),
        Err(CliError::UnknownPlayer(name)) if name == "nobody"
    ));
}

#[test]
fn resolve_history_match_by_full_id_and_prefix() {
    let history = vec![
        archived("0190a1b2-1111-7000-8000-000000000001", "Rivals"),
        archived("0190a1b2-2222-7000-8000-000000000002", "Harlequins"),
    ];

    let full = resolve_history_match(&history, "0190a1b2-2222-7000-8000-000000000002").unwrap();
    assert_eq!(full, history[1].id);

    let prefix = resolve_history_match(&history, "0190a1b2-11").unwrap();
    assert_eq!(prefix, history[0].id);
}

#[test]
fn resolve_history_match_rejects_ambiguous_and_unknown_prefixes() {
    let history = vec![
        archived("0190a1b2-1111-7000-8000-000000000001", "Rivals"),
        archived("0190a1b2-2222-7000-8000-000000000002", "Harlequins"),
    ];

    let error = resolve_history_match(&history, "0190a1b2").unwrap_err();
    assert!(matches!(error, CliError::AmbiguousMatchId(_)));
    assert!(error.to_string().contains("0190a1b2-1111"));

    assert!(matches!(
        resolve_history_match(&history, "ffff"),
        Err(CliError::MatchNotFound(_))
    ));
    assert!(matches!(
        resolve_history_match(&history, "  "),
        Err(CliError::MatchNotFound(_))
    ));
}

#[test]
fn status_lines_put_home_side_first() {
    let roster = Roster::default();
    let mut game = Match::new("Rivals", false, 0, true);
    game.opponent_score = 7;
    game.elapsed_at_pause_ms = 95_000;
    game.pause_time_ms = Some(95_000);

    let status = status_item(&game, MatchPhase::Paused, &roster, "Southwell City", 200_000);
    let lines = format_status_lines(&status);

    assert_eq!(lines[0], "Rivals 7 - 0 Southwell City");
    assert_eq!(lines[1], "01:35  (paused)");
    assert_eq!(lines.len(), 3 + roster.players().len());
}

#[test]
fn log_lines_mark_empty_sections() {
    let game = Match::new("Rivals", true, 0, true);
    let lines = format_log_lines(&game);
    assert_eq!(
        lines,
        vec![
            "Scores:",
            "  (none)",
            "Substitutions:",
            "  (none)",
            "Tackles:",
            "  (none)",
        ]
    );
}

#[test]
fn history_line_includes_result_and_comment() {
    let mut game = archived("0190a1b2-1111-7000-8000-000000000001", "Rivals");
    game.comments = "Wet day".to_string();
    let summary = MatchSummary::of(&game, &Roster::default(), 0);

    let line = format_history_line(&summary, "Southwell City");
    assert!(line.starts_with("0190a1b2-1111  Southwell City 0 - 0 Rivals  Draw"));
    assert!(line.ends_with("\"Wet day\""));
}

#[test]
fn read_config_file_reports_missing_and_invalid_files() {
    let missing = std::env::temp_dir().join(format!("touchline-missing-{}.json", unique_suffix()));
    assert!(matches!(
        read_config_file(&missing),
        Err(CliError::Config(message)) if message.contains("cannot read")
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"team_nmae": "typo"}"#).unwrap();
    assert!(matches!(read_config_file(&path), Err(CliError::Config(_))));

    std::fs::write(&path, r#"{"team_name": "Harbour RFC"}"#).unwrap();
    assert_eq!(read_config_file(&path).unwrap().team_name, "Harbour RFC");
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn match_flow_persists_across_sessions() {
    let db_path = unique_test_db_path();
    {
        let session = open_session(&db_path, ClientConfig::default()).await.unwrap();

        let phase = run_start(&session, Some("Rivals"), false).await.unwrap();
        assert_eq!(phase, MatchPhase::Paused);

        run_score(&session, "p01", ScoreType::Try).await.unwrap();
        run_score(&session, "Cory", ScoreType::Conversion).await.unwrap();
        run_undo(&session).await.unwrap();
        run_tackle(&session, "p03").await.unwrap();

        let status = current_status(&session, now_ms()).await.unwrap();
        assert_eq!(status.our_score, 5);
        assert!(status.is_home);

        let summary = run_finish(&session).await.unwrap();
        assert_eq!(summary.result, MatchResult::Win);
        assert_eq!(summary.our_score, 5);

        run_archive(&session, Some("Great defence".to_string()))
            .await
            .unwrap();
    }
    {
        let session = open_session(&db_path, ClientConfig::default()).await.unwrap();
        assert!(current_status(&session, now_ms()).await.is_none());

        let summaries = history_summaries(&session).await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].opponent_name, "Rivals");
        assert_eq!(summaries[0].comments, "Great defence");
    }

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn history_comment_and_delete_use_id_prefix() {
    let db_path = unique_test_db_path();
    let session = open_session(&db_path, ClientConfig::default()).await.unwrap();

    run_start(&session, None, false).await.unwrap();
    run_finish(&session).await.unwrap();
    run_archive(&session, None).await.unwrap();

    let id = history_summaries(&session).await[0].id.to_string();
    let prefix = &id[..13];

    run_history_comment(&session, prefix, &["Late".to_string(), "kickoff".to_string()])
        .await
        .unwrap();
    assert_eq!(history_summaries(&session).await[0].comments, "Late kickoff");

    run_history_delete(&session, prefix).await.unwrap();
    assert!(history_summaries(&session).await.is_empty());

    drop(session);
    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn token_set_and_clear() {
    let db_path = unique_test_db_path();
    let session = open_session(&db_path, ClientConfig::default()).await.unwrap();

    assert!(matches!(
        run_token_set(&session, "   ").await,
        Err(CliError::EmptyToken)
    ));

    run_token_set(&session, " secret-key ").await.unwrap();
    assert_eq!(
        session.service.store().load_token().await.unwrap().as_deref(),
        Some("secret-key")
    );

    run_token_clear(&session).await.unwrap();
    assert_eq!(session.service.store().load_token().await.unwrap(), None);

    drop(session);
    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn sync_requires_configured_endpoint() {
    let db_path = unique_test_db_path();
    let session = open_session(&db_path, ClientConfig::default()).await.unwrap();

    assert!(matches!(
        sync_engine(&session),
        Err(CliError::SyncNotConfigured)
    ));
    drop(session);

    let configured = ClientConfig::default()
        .with_sync_url(Some("https://sync.example.com".to_string()));
    let session = open_session(&db_path, configured).await.unwrap();
    assert!(sync_engine(&session).is_ok());

    drop(session);
    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn export_then_import_restores_history() {
    let source_db = unique_test_db_path();
    let target_db = unique_test_db_path();
    let output_dir = tempfile::tempdir().unwrap();

    let exported = {
        let session = open_session(&source_db, ClientConfig::default()).await.unwrap();
        run_start(&session, Some("Rivals"), true).await.unwrap();
        run_score(&session, "p04", ScoreType::Penalty).await.unwrap();
        run_finish(&session).await.unwrap();
        run_archive(&session, Some("Away win".to_string())).await.unwrap();
        run_export(&session, Some(output_dir.path())).await.unwrap()
    };

    let file_name = exported.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("rug-"));
    assert!(file_name.ends_with(".json"));
    let contents = std::fs::read_to_string(&exported).unwrap();
    assert!(contents.contains("\n    \"historicMatches\""));

    let session = open_session(&target_db, ClientConfig::default()).await.unwrap();
    run_import(&session, &exported).await.unwrap();
    let summaries = history_summaries(&session).await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].our_score, 3);
    assert_eq!(summaries[0].comments, "Away win");

    drop(session);
    cleanup_db_files(&source_db);
    cleanup_db_files(&target_db);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn import_rejects_invalid_file_and_keeps_state() {
    let db_path = unique_test_db_path();
    let dir = tempfile::tempdir().unwrap();
    let bad_file = dir.path().join("broken.json");
    std::fs::write(&bad_file, "{ not json").unwrap();

    let session = open_session(&db_path, ClientConfig::default()).await.unwrap();
    run_start(&session, Some("Rivals"), false).await.unwrap();

    assert!(run_import(&session, &bad_file).await.is_err());
    let status = current_status(&session, now_ms()).await.unwrap();
    assert_eq!(status.opponent_name, "Rivals");

    drop(session);
    cleanup_db_files(&db_path);
}

#[test]
fn run_completions_writes_bash_script_file() {
    let output_path =
        std::env::temp_dir().join(format!("touchline-completions-test-{}.bash", unique_suffix()));

    run_completions(CompletionShell::Bash, Some(&output_path)).unwrap();

    let script = std::fs::read_to_string(&output_path).unwrap();
    assert!(script.contains("touchline"));

    let _ = std::fs::remove_file(output_path);
}

fn unique_suffix() -> String {
    static NEXT_SUFFIX: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let sequence = NEXT_SUFFIX.fetch_add(1, Ordering::Relaxed);
    format!("{timestamp}-{sequence}")
}

fn unique_test_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("touchline-cli-test-{}.db", unique_suffix()))
}

fn cleanup_db_files(path: &PathBuf) {
    // On Windows, libsql can keep file handles alive briefly after drop.
    if cfg!(windows) {
        return;
    }

    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
}
