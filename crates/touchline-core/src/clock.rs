//! Match clock: elapsed running time as a pure function of `(Match, now)`.
//!
//! All timestamps are Unix milliseconds. Interval arithmetic clamps at zero
//! so a skewed device clock can never wind the match time backwards.

use crate::error::{Error, Result};
use crate::models::Match;

/// Elapsed running time in milliseconds.
///
/// While running this is the carried-forward total plus the open interval;
/// while paused or finished it is the carried-forward total alone.
pub fn elapsed_ms(game: &Match, now_ms: i64) -> i64 {
    if game.pause_time_ms.is_none() && !game.is_finished {
        interval_ms(game.start_time_ms, now_ms).saturating_add(game.elapsed_at_pause_ms.max(0))
    } else {
        game.elapsed_at_pause_ms.max(0)
    }
}

/// Stop the clock, folding the open interval into `elapsed_at_pause_ms`.
pub fn pause(game: &mut Match, now_ms: i64) -> Result<()> {
    if game.is_finished {
        return Err(Error::MatchFinished);
    }
    if game.pause_time_ms.is_some() {
        return Err(Error::Validation("match is already paused".to_string()));
    }

    game.elapsed_at_pause_ms = elapsed_ms(game, now_ms);
    game.pause_time_ms = Some(now_ms);
    Ok(())
}

/// Restart the clock. The carried-forward total is left as is.
pub fn resume(game: &mut Match, now_ms: i64) -> Result<()> {
    if game.is_finished {
        return Err(Error::MatchFinished);
    }
    if game.pause_time_ms.is_none() {
        return Err(Error::Validation("match is not paused".to_string()));
    }

    game.start_time_ms = now_ms;
    game.pause_time_ms = None;
    Ok(())
}

/// Close the clock for good, returning the final elapsed time.
pub(crate) fn stop(game: &mut Match, now_ms: i64) -> i64 {
    let total = elapsed_ms(game, now_ms);
    game.elapsed_at_pause_ms = total;
    game.pause_time_ms = None;
    game.is_finished = true;
    total
}

/// Length of `[from, to]`, never negative.
pub fn interval_ms(from_ms: i64, to_ms: i64) -> i64 {
    to_ms.saturating_sub(from_ms).max(0)
}

/// Whole seconds in `[from, to]`, never negative.
pub fn interval_seconds(from_ms: i64, to_ms: i64) -> u64 {
    u64::try_from(interval_ms(from_ms, to_ms) / 1000).unwrap_or(0)
}

/// `MM:SS` display of a duration.
pub fn format_clock(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// `Xm YYs` display of a playtime.
pub fn format_playtime(seconds: u64) -> String {
    format!("{}m {:02}s", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_match(start_ms: i64) -> Match {
        Match::new("Eagles", true, start_ms, false)
    }

    #[test]
    fn elapsed_counts_open_interval_while_running() {
        let game = running_match(1_000);
        assert_eq!(elapsed_ms(&game, 1_000), 0);
        assert_eq!(elapsed_ms(&game, 61_000), 60_000);
    }

    #[test]
    fn elapsed_is_monotonic_while_running() {
        let game = running_match(0);
        let mut previous = 0;
        for now in (0..10_000).step_by(250) {
            let current = elapsed_ms(&game, now);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn elapsed_saturates_on_huge_carried_total() {
        let mut game = running_match(0);
        game.elapsed_at_pause_ms = i64::MAX;
        assert_eq!(elapsed_ms(&game, 1_000), i64::MAX);
    }

    #[test]
    fn elapsed_clamps_clock_skew() {
        let game = running_match(10_000);
        assert_eq!(elapsed_ms(&game, 5_000), 0);
    }

    #[test]
    fn elapsed_is_constant_while_paused() {
        let mut game = running_match(0);
        pause(&mut game, 30_000).unwrap();
        assert_eq!(elapsed_ms(&game, 30_000), 30_000);
        assert_eq!(elapsed_ms(&game, 90_000), 30_000);
    }

    #[test]
    fn pause_then_resume_keeps_elapsed_at_resume_instant() {
        let mut game = running_match(0);
        pause(&mut game, 120_000).unwrap();
        resume(&mut game, 125_000).unwrap();

        assert_eq!(elapsed_ms(&game, 125_000), 120_000);
        assert_eq!(elapsed_ms(&game, 126_000), 121_000);
    }

    #[test]
    fn elapsed_sums_closed_intervals() {
        let mut game = running_match(0);
        pause(&mut game, 10_000).unwrap();
        resume(&mut game, 20_000).unwrap();
        pause(&mut game, 25_000).unwrap();
        resume(&mut game, 40_000).unwrap();

        assert_eq!(elapsed_ms(&game, 42_000), 10_000 + 5_000 + 2_000);
    }

    #[test]
    fn pause_and_resume_reject_wrong_state() {
        let mut game = running_match(0);
        assert!(matches!(resume(&mut game, 5), Err(Error::Validation(_))));

        pause(&mut game, 10).unwrap();
        assert!(matches!(pause(&mut game, 20), Err(Error::Validation(_))));
        assert_eq!(game.pause_time_ms, Some(10));

        stop(&mut game, 30);
        assert!(matches!(resume(&mut game, 40), Err(Error::MatchFinished)));
        assert!(matches!(pause(&mut game, 40), Err(Error::MatchFinished)));
    }

    #[test]
    fn stop_freezes_total() {
        let mut game = running_match(0);
        assert_eq!(stop(&mut game, 90_000), 90_000);
        assert!(game.is_finished);
        assert_eq!(elapsed_ms(&game, 500_000), 90_000);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(125_999), "02:05");
        assert_eq!(format_playtime(65), "1m 05s");
        assert_eq!(interval_seconds(0, 30_999), 30);
        assert_eq!(interval_seconds(10, 0), 0);
    }
}
