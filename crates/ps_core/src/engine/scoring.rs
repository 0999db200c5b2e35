//! The scoring rules engine: point progression, deuce/advantage, tie-break,
//! set completion and match completion.
//!
//! Operations consume the current state by value (deep copy) and return a new,
//! fully independent value; callers swap their held reference. Undo is a pure
//! snapshot restore, never arithmetic reversal, which makes it exact across
//! deuce flips, game wins, set wins and match completion.

use crate::schema::{current_timestamp, MatchStatus, SetRecord};

use super::history::SnapshotHistory;
use super::state::{PointScore, RuntimeMatchState, Team};
use super::EngineError;

/// Score a point for `team`.
///
/// A finished match never accepts further points; the call degrades to an
/// independent copy of the unchanged state and pushes nothing. Otherwise the
/// *pre-mutation* snapshot is pushed (tagged with the scorer) so that undo
/// restores the state as it was immediately before this action.
pub fn add_point(
    state: &RuntimeMatchState,
    team: Team,
    history: Option<&mut SnapshotHistory>,
) -> RuntimeMatchState {
    if state.status == MatchStatus::Finished {
        log::debug!("Ignoring point for {}: match already finished", team);
        return state.clone();
    }

    if let Some(history) = history {
        history.push(team, state.clone());
    }

    let mut next = state.clone();
    next.updated_at = current_timestamp();

    if next.in_tie_break() {
        score_tie_break_point(&mut next, team);
    } else {
        score_game_point(&mut next, team);
    }

    next
}

/// Undo the most recent scoring action by restoring its stored snapshot.
///
/// No-ops (returning an independent copy) on the canonical initial state, on a
/// missing history stack, and on an empty stack. A popped snapshot that fails
/// the restorable predicate is a corrupted stack, which is a caller bug.
pub fn remove_point(
    state: &RuntimeMatchState,
    history: Option<&mut SnapshotHistory>,
) -> Result<RuntimeMatchState, EngineError> {
    if state.is_initial() {
        return Ok(state.clone());
    }

    let Some(history) = history else {
        return Ok(state.clone());
    };

    let Some(entry) = history.pop() else {
        return Ok(state.clone());
    };

    if !entry.snapshot.is_restorable() {
        return Err(EngineError::CorruptSnapshot);
    }

    Ok(entry.snapshot)
}

/// Tie-break scoring: plain integer points, won at >= 7 with a margin of at
/// least two. Open-ended, so 8-6, 9-7 and beyond are all valid continuations.
fn score_tie_break_point(next: &mut RuntimeMatchState, team: Team) {
    let opponent = team.opponent();
    let scorer_points = next.team(team).points.tie_break_points() + 1;
    let opponent_points = next.team(opponent).points.tie_break_points();

    next.team_mut(team).points = PointScore::TieBreak(scorer_points);
    next.team_mut(opponent).points = PointScore::TieBreak(opponent_points);

    if scorer_points >= 7 && scorer_points >= opponent_points + 2 {
        win_game(next, team);
        complete_set(next, team, true);
    }
}

/// Regular game scoring: Love -> 15 -> 30 -> 40, deuce and advantage. From
/// advantage the other team scoring returns both to deuce; advantage is lost,
/// not transferred.
fn score_game_point(next: &mut RuntimeMatchState, team: Team) {
    let opponent = team.opponent();
    let opponent_points = next.team(opponent).points;

    match next.team(team).points {
        PointScore::Love => next.team_mut(team).points = PointScore::Fifteen,
        PointScore::Fifteen => next.team_mut(team).points = PointScore::Thirty,
        PointScore::Thirty => next.team_mut(team).points = PointScore::Forty,
        PointScore::Forty => match opponent_points {
            PointScore::Forty => next.team_mut(team).points = PointScore::Advantage,
            PointScore::Advantage => next.team_mut(opponent).points = PointScore::Forty,
            _ => {
                win_game(next, team);
                try_complete_set(next, team);
            }
        },
        PointScore::Advantage => {
            win_game(next, team);
            try_complete_set(next, team);
        }
        // Integer points outside a tie-break are corrupt input; restart the
        // scorer's ladder rather than propagate them.
        PointScore::TieBreak(_) => next.team_mut(team).points = PointScore::Fifteen,
    }
}

fn win_game(next: &mut RuntimeMatchState, team: Team) {
    next.team_mut(team).games += 1;
    match team {
        Team::TeamA => next.current_set_status.team_a_games += 1,
        Team::TeamB => next.current_set_status.team_b_games += 1,
    }

    next.team_a.points = PointScore::Love;
    next.team_b.points = PointScore::Love;
}

/// Regular-mode set completion: >= 6 games with a margin of at least two.
/// 6-5 plays on to either 7-5 or a 6-6 tie-break.
fn try_complete_set(next: &mut RuntimeMatchState, team: Team) {
    let winner_games = match team {
        Team::TeamA => next.current_set_status.team_a_games,
        Team::TeamB => next.current_set_status.team_b_games,
    };
    let loser_games = match team {
        Team::TeamA => next.current_set_status.team_b_games,
        Team::TeamB => next.current_set_status.team_a_games,
    };

    if winner_games >= 6 && winner_games >= loser_games + 2 {
        complete_set(next, team, false);
    }
}

fn complete_set(next: &mut RuntimeMatchState, winner: Team, via_tie_break: bool) {
    // A tie-break set is always recorded as 7-6 for the winner, regardless of
    // the exact tie-break point tally.
    let (team_a_games, team_b_games) = if via_tie_break {
        match winner {
            Team::TeamA => (7, 6),
            Team::TeamB => (6, 7),
        }
    } else {
        (next.current_set_status.team_a_games, next.current_set_status.team_b_games)
    };

    next.set_history.push(SetRecord {
        set_number: next.current_set_status.number,
        team_a_games,
        team_b_games,
    });

    *next.sets_won.get_mut(winner) += 1;

    next.team_a.games = 0;
    next.team_b.games = 0;
    next.current_set_status.team_a_games = 0;
    next.current_set_status.team_b_games = 0;

    if next.sets_won.get(winner) >= next.sets_needed_to_win {
        next.status = MatchStatus::Finished;
        next.winner_team = Some(winner);
        log::info!("Match finished: {} wins {} sets", winner, next.sets_won.get(winner));
    } else {
        next.current_set_status.number += 1;
        next.current_set = next.current_set_status.number;
    }
}
