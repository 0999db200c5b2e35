//! Live (denormalized) match representation consumed by the scoring engine,
//! and the conversions to and from the canonical schema shape.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::schema::{
    current_timestamp, CurrentGame, CurrentSet, MatchState, MatchStatus, SetRecord, TeamScores,
};

/// The two sides of the court. A closed enum: an invalid team identifier is
/// unrepresentable, which is how the "fail fast on a bad team" contract is
/// expressed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    #[serde(rename = "teamA")]
    TeamA,
    #[serde(rename = "teamB")]
    TeamB,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::TeamA => Team::TeamB,
            Team::TeamB => Team::TeamA,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::TeamA => write!(f, "team A"),
            Team::TeamB => write!(f, "team B"),
        }
    }
}

impl TeamScores {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::TeamA => self.team_a,
            Team::TeamB => self.team_b,
        }
    }

    pub fn get_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::TeamA => &mut self.team_a,
            Team::TeamB => &mut self.team_b,
        }
    }
}

/// A team's score within the game in progress: the symbolic ladder during a
/// regular game, a plain point count once the set is in a tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointScore {
    Love,
    Fifteen,
    Thirty,
    Forty,
    Advantage,
    TieBreak(u32),
}

impl PointScore {
    /// Scoreboard label for a regular-game score. Tie-break tallies have no
    /// fixed label; they display as the count itself.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            PointScore::Love => Some("0"),
            PointScore::Fifteen => Some("15"),
            PointScore::Thirty => Some("30"),
            PointScore::Forty => Some("40"),
            PointScore::Advantage => Some("AD"),
            PointScore::TieBreak(_) => None,
        }
    }

    /// Tie-break view of this score. Symbolic values collapse to zero, which
    /// also normalizes a corrupt symbolic leftover inside a tie-break.
    pub fn tie_break_points(&self) -> u32 {
        match self {
            PointScore::TieBreak(points) => *points,
            _ => 0,
        }
    }
}

impl fmt::Display for PointScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointScore::TieBreak(points) => write!(f, "{}", points),
            // label() is Some for every non-tie-break score
            regular => f.write_str(regular.label().unwrap_or_default()),
        }
    }
}

// Wire format shared with the legacy persisted record: regular points are the
// scoreboard labels "0"/"15"/"30"/"40"/"AD", tie-break points a bare integer.
impl Serialize for PointScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PointScore::TieBreak(points) => serializer.serialize_u32(*points),
            regular => serializer.serialize_str(regular.label().unwrap_or_default()),
        }
    }
}

impl<'de> Deserialize<'de> for PointScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PointScoreVisitor;

        impl<'de> Visitor<'de> for PointScoreVisitor {
            type Value = PointScore;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a point label (\"0\", \"15\", \"30\", \"40\", \"AD\") or a tie-break point count")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PointScore, E> {
                match v {
                    "0" => Ok(PointScore::Love),
                    "15" => Ok(PointScore::Fifteen),
                    "30" => Ok(PointScore::Thirty),
                    "40" => Ok(PointScore::Forty),
                    "AD" => Ok(PointScore::Advantage),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<PointScore, E> {
                u32::try_from(v)
                    .map(PointScore::TieBreak)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<PointScore, E> {
                if v < 0 {
                    return Err(E::invalid_value(de::Unexpected::Signed(v), &self));
                }
                self.visit_u64(v as u64)
            }
        }

        deserializer.deserialize_any(PointScoreVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamScore {
    pub points: PointScore,
    pub games: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSetStatus {
    pub number: u32,
    pub team_a_games: u32,
    pub team_b_games: u32,
}

/// Small denormalized winner view for a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchWinner {
    pub team: Team,
    pub sets_won: u32,
    pub sets_lost: u32,
}

/// Per-interaction working state. Mutated only through the scoring engine,
/// which consumes it by value and returns a fully independent successor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeMatchState {
    pub team_a: TeamScore,
    pub team_b: TeamScore,

    pub current_set_status: CurrentSetStatus,

    /// Legacy mirror of `current_set_status.number`; always kept equal.
    pub current_set: u32,

    pub status: MatchStatus,

    pub sets_won: TeamScores,

    pub sets_needed_to_win: u32,

    #[serde(default)]
    pub set_history: Vec<SetRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_team: Option<Team>,

    /// Unix milliseconds of the last accepted point.
    pub updated_at: u64,
}

impl RuntimeMatchState {
    /// Fresh live state for a match needing `sets_needed_to_win` sets.
    pub fn initial(sets_needed_to_win: u32) -> Self {
        Self {
            team_a: TeamScore { points: PointScore::Love, games: 0 },
            team_b: TeamScore { points: PointScore::Love, games: 0 },
            current_set_status: CurrentSetStatus { number: 1, team_a_games: 0, team_b_games: 0 },
            current_set: 1,
            status: MatchStatus::Active,
            sets_won: TeamScores::default(),
            sets_needed_to_win,
            set_history: Vec::new(),
            winner_team: None,
            updated_at: current_timestamp(),
        }
    }

    pub fn team(&self, team: Team) -> &TeamScore {
        match team {
            Team::TeamA => &self.team_a,
            Team::TeamB => &self.team_b,
        }
    }

    pub fn team_mut(&mut self, team: Team) -> &mut TeamScore {
        match team {
            Team::TeamA => &mut self.team_a,
            Team::TeamB => &mut self.team_b,
        }
    }

    /// Tie-break mode is entered precisely at 6-6 games.
    pub fn in_tie_break(&self) -> bool {
        self.status == MatchStatus::Active
            && self.current_set_status.team_a_games == 6
            && self.current_set_status.team_b_games == 6
    }

    /// Indistinguishable from a canonical fresh match: love-love, no games,
    /// set 1, no recorded progress. Timestamps are ignored.
    pub fn is_initial(&self) -> bool {
        self.status == MatchStatus::Active
            && self.team_a.points == PointScore::Love
            && self.team_b.points == PointScore::Love
            && self.team_a.games == 0
            && self.team_b.games == 0
            && self.current_set_status
                == CurrentSetStatus { number: 1, team_a_games: 0, team_b_games: 0 }
            && self.current_set == 1
            && self.sets_won == TeamScores::default()
            && self.set_history.is_empty()
            && self.winner_team.is_none()
    }

    /// Whether this value is safe to hand back from the undo stack. Point
    /// values and counters are valid by type; what remains is internal
    /// consistency between the mirrored fields.
    pub fn is_restorable(&self) -> bool {
        self.current_set_status.number >= 1
            && self.current_set == self.current_set_status.number
            && self.team_a.games == self.current_set_status.team_a_games
            && self.team_b.games == self.current_set_status.team_b_games
    }

    pub fn winner_summary(&self) -> Option<MatchWinner> {
        let team = self.winner_team?;
        Some(MatchWinner {
            team,
            sets_won: self.sets_won.get(team),
            sets_lost: self.sets_won.get(team.opponent()),
        })
    }
}

/// Canonical -> live. Done once per session activation.
pub fn denormalize(state: &MatchState) -> RuntimeMatchState {
    let tie_break = state.status == MatchStatus::Active
        && state.current_set.games.team_a == 6
        && state.current_set.games.team_b == 6;

    let to_points = |count: u32| -> PointScore {
        if tie_break {
            return PointScore::TieBreak(count);
        }
        match count {
            0 => PointScore::Love,
            1 => PointScore::Fifteen,
            2 => PointScore::Thirty,
            3 => PointScore::Forty,
            _ => PointScore::Advantage,
        }
    };

    let winner_team = match state.status {
        MatchStatus::Finished => {
            if state.sets_won.team_a > state.sets_won.team_b {
                Some(Team::TeamA)
            } else {
                Some(Team::TeamB)
            }
        }
        MatchStatus::Active => None,
    };

    RuntimeMatchState {
        team_a: TeamScore {
            points: to_points(state.current_game.points.team_a),
            games: state.current_set.games.team_a,
        },
        team_b: TeamScore {
            points: to_points(state.current_game.points.team_b),
            games: state.current_set.games.team_b,
        },
        current_set_status: CurrentSetStatus {
            number: state.current_set.number,
            team_a_games: state.current_set.games.team_a,
            team_b_games: state.current_set.games.team_b,
        },
        current_set: state.current_set.number,
        status: state.status,
        sets_won: state.sets_won,
        sets_needed_to_win: state.sets_needed_to_win,
        set_history: state.set_history.clone(),
        winner_team,
        updated_at: state.updated_at,
    }
}

/// Live -> canonical. The match format is derived back from
/// `sets_needed_to_win` ({1->1, 2->3, 3->5}).
pub fn normalize(state: &RuntimeMatchState) -> MatchState {
    let from_points = |points: &PointScore| -> u32 {
        match points {
            PointScore::Love => 0,
            PointScore::Fifteen => 1,
            PointScore::Thirty => 2,
            PointScore::Forty => 3,
            PointScore::Advantage => 4,
            PointScore::TieBreak(count) => *count,
        }
    };

    MatchState {
        status: state.status,
        sets_to_play: state.sets_needed_to_win.saturating_mul(2).saturating_sub(1).max(1),
        sets_needed_to_win: state.sets_needed_to_win,
        sets_won: state.sets_won,
        current_set: CurrentSet {
            number: state.current_set_status.number,
            games: TeamScores {
                team_a: state.current_set_status.team_a_games,
                team_b: state.current_set_status.team_b_games,
            },
        },
        current_game: CurrentGame {
            points: TeamScores {
                team_a: from_points(&state.team_a.points),
                team_b: from_points(&state.team_b.points),
            },
        },
        set_history: state.set_history.clone(),
        updated_at: state.updated_at,
        schema_version: crate::schema::SCHEMA_VERSION,
    }
}
