//! Session lifecycle: creating a fresh match, owning the live state and its
//! undo history for the duration of a session, and the new-match reset flow.

use thiserror::Error;

use crate::engine::{
    add_point, denormalize, normalize, remove_point, remove_point_for_team, EngineError,
    RuntimeMatchState, SnapshotHistory, Team,
};
use crate::schema::MatchState;
use crate::storage::{MatchStore, StorageAdapter};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("setsToPlay must be 1, 3 or 5, got {0}")]
    InvalidSetsToPlay(u32),
}

/// Build the canonical state for a new match.
///
/// `sets_to_play` outside {1, 3, 5} is rejected with a descriptive error;
/// there is no implicit coercion. Every call produces fully independent
/// nested values.
pub fn initialize_match_state(sets_to_play: u32) -> Result<MatchState, SessionError> {
    if !matches!(sets_to_play, 1 | 3 | 5) {
        return Err(SessionError::InvalidSetsToPlay(sets_to_play));
    }
    Ok(MatchState::initial(sets_to_play))
}

/// Reported result of a session reset. Each sub-step is independently
/// best-effort; one failing never prevents the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetOutcome {
    pub schema_record_cleared: bool,
    pub legacy_record_cleared: bool,
    pub runtime_reset: bool,
}

/// The one coordinating owner of a live match: the runtime state plus its
/// undo history. Consumers hold a reference to the session instead of
/// reaching for ambient global state.
#[derive(Debug, Clone)]
pub struct MatchSession {
    state: RuntimeMatchState,
    history: SnapshotHistory,
}

impl MatchSession {
    /// Start a fresh match in the given format.
    pub fn new(sets_to_play: u32) -> Result<Self, SessionError> {
        let canonical = initialize_match_state(sets_to_play)?;
        Ok(Self::resume(&canonical))
    }

    /// Activate a session over an existing canonical state (a loaded save).
    /// The undo history starts empty: persisted matches resume without a
    /// pre-restart undo trail.
    pub fn resume(state: &MatchState) -> Self {
        Self { state: denormalize(state), history: SnapshotHistory::new() }
    }

    /// Activate a session from whatever the store holds, if anything.
    pub fn restore<S: StorageAdapter>(store: &MatchStore<S>) -> Option<Self> {
        store.load().map(|state| Self::resume(&state))
    }

    pub fn state(&self) -> &RuntimeMatchState {
        &self.state
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    pub fn add_point(&mut self, team: Team) -> &RuntimeMatchState {
        self.state = add_point(&self.state, team, Some(&mut self.history));
        &self.state
    }

    pub fn undo(&mut self) -> Result<&RuntimeMatchState, EngineError> {
        self.state = remove_point(&self.state, Some(&mut self.history))?;
        Ok(&self.state)
    }

    pub fn undo_for_team(&mut self, team: Team) -> Result<&RuntimeMatchState, EngineError> {
        self.state = remove_point_for_team(&self.state, team, &mut self.history)?;
        Ok(&self.state)
    }

    /// Renormalize the live state into the canonical schema shape.
    pub fn to_match_state(&self) -> MatchState {
        normalize(&self.state)
    }

    /// Persist the current state through the store (best-effort).
    pub fn persist<S: StorageAdapter>(&self, store: &mut MatchStore<S>) {
        store.save(&self.to_match_state());
    }

    /// Back to a fresh initial state in the same format; the undo history
    /// is dropped with it.
    pub fn reset(&mut self) {
        self.state = RuntimeMatchState::initial(self.state.sets_needed_to_win);
        self.history.clear();
    }
}

/// New-match flow: clear both persisted records and reset the live session.
pub fn reset_session<S: StorageAdapter>(
    store: &mut MatchStore<S>,
    session: &mut MatchSession,
) -> ResetOutcome {
    let (schema_record_cleared, legacy_record_cleared) = store.clear();

    session.reset();

    let outcome = ResetOutcome { schema_record_cleared, legacy_record_cleared, runtime_reset: true };
    log::info!(
        "Session reset: schema cleared={}, legacy cleared={}",
        outcome.schema_record_cleared,
        outcome.legacy_record_cleared
    );
    outcome
}
