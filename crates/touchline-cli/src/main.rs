//! Touchline CLI - record a live rugby match from the command line
//!
//! Every command loads the persisted match, applies one change, and writes it
//! back before exiting.

mod cli;
mod commands;
mod config;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{
    Cli, Commands, HistoryCommands, OpponentCommands, SyncCommands, TokenCommands,
};
use crate::commands::common::open_session;
use crate::commands::completions::run_completions;
use crate::commands::export::{run_export, run_import};
use crate::commands::game::{
    run_archive, run_dismiss, run_finish, run_opponent_score, run_opponent_undo, run_pause,
    run_remove_score, run_resume, run_score, run_side, run_start, run_sub, run_tackle, run_undo,
};
use crate::commands::history::{run_history_comment, run_history_delete, run_history_list};
use crate::commands::status::{run_log, run_status};
use crate::commands::sync::{
    run_pull, run_push, run_token_clear, run_token_set, run_token_status,
};
use crate::config::{load_config, resolve_db_path};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "touchline=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let config = load_config(cli.config.as_deref())?;
    let db_path = resolve_db_path(cli.db_path)?;
    let session = open_session(&db_path, config).await?;

    match cli.command {
        Commands::Start { opponent, away } => {
            run_start(&session, opponent.as_deref(), away).await?;
        }
        Commands::Score { player, score_type } => run_score(&session, &player, score_type).await?,
        Commands::Undo => run_undo(&session).await?,
        Commands::RemoveScore { log_id } => run_remove_score(&session, &log_id).await?,
        Commands::Opponent { command } => match command {
            OpponentCommands::Score { score_type } => {
                run_opponent_score(&session, score_type).await?;
            }
            OpponentCommands::Undo => run_opponent_undo(&session).await?,
        },
        Commands::Tackle { player } => run_tackle(&session, &player).await?,
        Commands::Sub { player } => run_sub(&session, &player).await?,
        Commands::Pause => run_pause(&session).await?,
        Commands::Resume => run_resume(&session).await?,
        Commands::Side { side } => run_side(&session, side).await?,
        Commands::Finish => {
            run_finish(&session).await?;
        }
        Commands::Dismiss => run_dismiss(&session).await?,
        Commands::Archive { comment } => run_archive(&session, comment).await?,
        Commands::Status { json, watch } => run_status(&session, json, watch).await?,
        Commands::Log => run_log(&session).await?,
        Commands::History { command } => match command {
            HistoryCommands::List { json } => run_history_list(&session, json).await?,
            HistoryCommands::Comment { id, text } => {
                run_history_comment(&session, &id, &text).await?;
            }
            HistoryCommands::Delete { id } => run_history_delete(&session, &id).await?,
        },
        Commands::Sync { command } => match command {
            SyncCommands::Pull => {
                run_pull(&session).await?;
            }
            SyncCommands::Push => {
                run_push(&session).await?;
            }
        },
        Commands::Token { command } => match command {
            TokenCommands::Set { token } => run_token_set(&session, &token).await?,
            TokenCommands::Clear => run_token_clear(&session).await?,
            TokenCommands::Status => run_token_status(&session).await?,
        },
        Commands::Export { path } => {
            run_export(&session, path.as_deref()).await?;
        }
        Commands::Import { path } => run_import(&session, &path).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
