//! Post-game summary of a match.

use std::fmt;

use serde::Serialize;

use crate::clock;
use crate::ledger;
use crate::models::{Match, MatchId, Roster};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Win => "Win",
            Self::Loss => "Loss",
            Self::Draw => "Draw",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: MatchId,
    pub opponent_name: String,
    pub is_home: bool,
    pub our_score: u32,
    pub opponent_score: u32,
    pub result: MatchResult,
    pub duration: String,
    pub top_tackler: String,
    pub comments: String,
}

impl MatchSummary {
    /// Summarize a match. Unfinished matches use the time at `now_ms`.
    pub fn of(game: &Match, roster: &Roster, now_ms: i64) -> Self {
        let our_score = ledger::total_score(game);
        let result = match our_score.cmp(&game.opponent_score) {
            std::cmp::Ordering::Greater => MatchResult::Win,
            std::cmp::Ordering::Less => MatchResult::Loss,
            std::cmp::Ordering::Equal => MatchResult::Draw,
        };

        Self {
            id: game.id,
            opponent_name: game.opponent_name.clone(),
            is_home: game.is_home,
            our_score,
            opponent_score: game.opponent_score,
            result,
            duration: clock::format_clock(clock::elapsed_ms(game, now_ms)),
            top_tackler: ledger::top_tackler_label(&game.tackle_counts, roster),
            comments: game.comments.clone(),
        }
    }

    /// `Home 12 - 7 Away` from our side's point of view.
    pub fn scoreline(&self, team_name: &str) -> String {
        if self.is_home {
            format!(
                "{team_name} {} - {} {}",
                self.our_score, self.opponent_score, self.opponent_name
            )
        } else {
            format!(
                "{} {} - {} {team_name}",
                self.opponent_name, self.opponent_score, self.our_score
            )
        }
    }
}
