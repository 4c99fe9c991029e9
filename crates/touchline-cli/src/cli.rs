use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use touchline_core::ScoreType;

#[derive(Parser)]
#[command(name = "touchline")]
#[command(about = "Record a live rugby match from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to config.json
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a new match
    Start {
        /// Opponent team name
        opponent: Option<String>,
        /// We are the away side
        #[arg(long)]
        away: bool,
    },
    /// Record a score for one of our players
    Score {
        /// Player id or name
        player: String,
        /// try, conversion, penalty or drop-goal
        score_type: ScoreType,
    },
    /// Undo our most recent score
    Undo,
    /// Remove a specific entry from the score log
    RemoveScore {
        /// Score log id (see `touchline log`)
        log_id: String,
    },
    /// Adjust the opponent's score
    Opponent {
        #[command(subcommand)]
        command: OpponentCommands,
    },
    /// Record a tackle
    Tackle {
        /// Player id or name
        player: String,
    },
    /// Substitute a player on or off
    Sub {
        /// Player id or name
        player: String,
    },
    /// Stop the match clock
    Pause,
    /// Restart the match clock
    Resume,
    /// Switch between home and away
    Side {
        #[arg(value_enum)]
        side: Side,
    },
    /// Finish the match and open the post-game confirmation
    Finish,
    /// Close the post-game confirmation without archiving
    Dismiss,
    /// File the finished match into history
    Archive {
        /// Post-game comment
        #[arg(long)]
        comment: Option<String>,
    },
    /// Show the current match
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Refresh every second until interrupted
        #[arg(long, conflicts_with = "json")]
        watch: bool,
    },
    /// Show score, substitution and tackle logs
    Log,
    /// Browse archived matches
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Exchange state with the sync host
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Manage the sync API key
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
    /// Export the full local state to a JSON file
    Export {
        /// Output file or directory (current directory when omitted)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// Replace local state with an exported JSON file
    Import {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Side {
    Home,
    Away,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum OpponentCommands {
    /// Add points using the rule table
    Score { score_type: ScoreType },
    /// Take back the opponent's last points
    Undo,
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List archived matches, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the comment of an archived match
    Comment {
        /// Match id or unique id prefix
        id: String,
        /// New comment
        text: Vec<String>,
    },
    /// Delete an archived match
    Delete {
        /// Match id or unique id prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Replace local state with the remote copy
    Pull,
    /// Send local state to the remote
    Push,
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Store the API key
    Set { token: String },
    /// Remove the stored API key
    Clear,
    /// Show whether an API key is stored
    Status,
}
