//! Workout state transitions.
//!
//! [`reduce`] is the only place [`WorkoutState`] changes. Each action maps to
//! a pure `(state, payload) -> state` function that can be tested without a
//! store or any storage behind it.

use crate::stats::calculate_stats;
use crate::{duration_minutes, WorkoutHistory, WorkoutPatch, WorkoutSession, WorkoutStats};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// In-memory state of the tracker
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutState {
    pub workout_history: WorkoutHistory,
    pub current_workout: Option<WorkoutSession>,
    pub stats: WorkoutStats,
}

impl WorkoutState {
    /// Idle state over an existing history, with stats derived from it
    pub fn with_history(history: WorkoutHistory) -> Self {
        load_history(Self::default(), history)
    }

    pub fn is_in_progress(&self) -> bool {
        self.current_workout.is_some()
    }
}

/// One state transition
#[derive(Clone, Debug, PartialEq)]
pub enum WorkoutAction {
    StartWorkout(WorkoutSession),
    UpdateWorkout(WorkoutPatch),
    FinishWorkout(WorkoutSession),
    DeleteWorkout {
        date: String,
        workout_id: String,
    },
    EditWorkoutTime {
        workout_id: String,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
    },
    LoadHistory(WorkoutHistory),
}

impl WorkoutAction {
    /// Short name for log lines
    pub fn name(&self) -> &'static str {
        match self {
            WorkoutAction::StartWorkout(_) => "start_workout",
            WorkoutAction::UpdateWorkout(_) => "update_workout",
            WorkoutAction::FinishWorkout(_) => "finish_workout",
            WorkoutAction::DeleteWorkout { .. } => "delete_workout",
            WorkoutAction::EditWorkoutTime { .. } => "edit_workout_time",
            WorkoutAction::LoadHistory(_) => "load_history",
        }
    }
}

/// Apply `action` to `state`
pub fn reduce(state: WorkoutState, action: WorkoutAction) -> WorkoutState {
    match action {
        WorkoutAction::StartWorkout(session) => start_workout(state, session),
        WorkoutAction::UpdateWorkout(patch) => update_workout(state, patch),
        WorkoutAction::FinishWorkout(session) => finish_workout(state, session),
        WorkoutAction::DeleteWorkout { date, workout_id } => {
            delete_workout(state, &date, &workout_id)
        }
        WorkoutAction::EditWorkoutTime {
            workout_id,
            start_time,
            end_time,
        } => edit_workout_time(state, &workout_id, start_time, end_time),
        WorkoutAction::LoadHistory(history) => load_history(state, history),
    }
}

/// Make `session` the current workout, replacing any workout in progress
pub fn start_workout(mut state: WorkoutState, session: WorkoutSession) -> WorkoutState {
    if let Some(previous) = &state.current_workout {
        tracing::warn!(
            "Starting workout {} replaces workout {} still in progress",
            session.id,
            previous.id
        );
    }
    state.current_workout = Some(session);
    state
}

/// Merge `patch` into the current workout; no-op when idle
pub fn update_workout(mut state: WorkoutState, patch: WorkoutPatch) -> WorkoutState {
    if let Some(current) = state.current_workout.as_mut() {
        patch.apply(current);
    }
    state
}

/// File `session` under its start date and return to idle
///
/// The session's aggregates are taken as given.
pub fn finish_workout(mut state: WorkoutState, session: WorkoutSession) -> WorkoutState {
    state.workout_history.push(session);
    state.current_workout = None;
    with_fresh_stats(state)
}

/// Remove `workout_id` from `date`, dropping the date once it is empty
pub fn delete_workout(mut state: WorkoutState, date: &str, workout_id: &str) -> WorkoutState {
    state.workout_history.remove(date, workout_id);
    with_fresh_stats(state)
}

/// Replace a finished workout's times and recompute its duration
///
/// The workout stays filed under its original date even if the new start
/// falls on another day.
pub fn edit_workout_time(
    mut state: WorkoutState,
    workout_id: &str,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
) -> WorkoutState {
    for session in state.workout_history.find_all_mut(workout_id) {
        session.start_time = start_time;
        session.end_time = end_time;
        session.duration = end_time.map(|end| duration_minutes(start_time, end));
    }
    with_fresh_stats(state)
}

/// Replace the whole history (startup hydration, import, clear)
pub fn load_history(mut state: WorkoutState, history: WorkoutHistory) -> WorkoutState {
    state.workout_history = history;
    with_fresh_stats(state)
}

fn with_fresh_stats(mut state: WorkoutState) -> WorkoutState {
    state.stats = calculate_stats(state.workout_history.sessions());
    state
}
