//! The workout store: the command and query surface for the tracker.
//!
//! All changes go through [`WorkoutStore::dispatch`], which runs the reducer
//! and then persists history whenever it changed. History is read from
//! storage exactly once, when the store is opened.

use crate::maintenance::MaintenanceSchedule;
use crate::reducer::{reduce, WorkoutAction, WorkoutState};
use crate::storage::HistoryStorage;
use crate::{StorageStats, WorkoutHistory, WorkoutPatch, WorkoutSession};
use chrono::{DateTime, Utc};

pub struct WorkoutStore<S: HistoryStorage> {
    state: WorkoutState,
    storage: S,
    maintenance: MaintenanceSchedule,
}

impl<S: HistoryStorage> WorkoutStore<S> {
    /// Open a store, hydrating history from `storage`
    pub fn open(storage: S) -> Self {
        Self::with_schedule(storage, MaintenanceSchedule::default())
    }

    pub fn with_schedule(storage: S, maintenance: MaintenanceSchedule) -> Self {
        let history = storage.load_history();
        tracing::info!(
            "Loaded {} workouts across {} dates",
            history.session_count(),
            history.date_count()
        );
        Self {
            state: WorkoutState::with_history(history),
            storage,
            maintenance,
        }
    }

    pub fn state(&self) -> &WorkoutState {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Apply `action` and persist history if it changed
    ///
    /// Hydration (`LoadHistory`) never writes back. An empty history is only
    /// written when a deletion emptied it, so an empty in-memory state cannot
    /// overwrite durable data any other way.
    pub fn dispatch(&mut self, action: WorkoutAction) {
        let name = action.name();
        let persists = !matches!(action, WorkoutAction::LoadHistory(_));
        let is_delete = matches!(action, WorkoutAction::DeleteWorkout { .. });

        let before = std::mem::take(&mut self.state);
        let previous_history = before.workout_history.clone();
        self.state = reduce(before, action);

        if !persists || self.state.workout_history == previous_history {
            tracing::trace!("{} left history unchanged", name);
            return;
        }
        if self.state.workout_history.is_empty() && !is_delete {
            tracing::debug!("{} produced empty history, not persisting", name);
            return;
        }
        self.storage.save_history(&self.state.workout_history);
    }

    pub fn start_workout(&mut self, session: WorkoutSession) {
        self.dispatch(WorkoutAction::StartWorkout(session));
    }

    pub fn update_workout(&mut self, patch: WorkoutPatch) {
        self.dispatch(WorkoutAction::UpdateWorkout(patch));
    }

    pub fn finish_workout(&mut self, session: WorkoutSession) {
        self.dispatch(WorkoutAction::FinishWorkout(session));
    }

    pub fn delete_workout(&mut self, date: &str, workout_id: &str) {
        self.dispatch(WorkoutAction::DeleteWorkout {
            date: date.to_string(),
            workout_id: workout_id.to_string(),
        });
    }

    pub fn edit_workout_time(
        &mut self,
        workout_id: &str,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
    ) {
        self.dispatch(WorkoutAction::EditWorkoutTime {
            workout_id: workout_id.to_string(),
            start_time,
            end_time,
        });
    }

    pub fn workouts_by_date(&self, date: &str) -> &[WorkoutSession] {
        self.state.workout_history.on_date(date)
    }

    pub fn workout_by_id(&self, id: &str) -> Option<&WorkoutSession> {
        self.state.workout_history.find(id)
    }

    pub fn history(&self) -> &WorkoutHistory {
        &self.state.workout_history
    }

    pub fn current_workout(&self) -> Option<&WorkoutSession> {
        self.state.current_workout.as_ref()
    }

    pub fn export_data(&self) -> String {
        self.storage.export_history()
    }

    /// Import an exported document; on success the store reloads history
    pub fn import_data(&mut self, blob: &str) -> bool {
        let imported = self.storage.import_history(blob);
        if imported {
            let history = self.storage.load_history();
            self.dispatch(WorkoutAction::LoadHistory(history));
        }
        imported
    }

    pub fn storage_stats(&self) -> StorageStats {
        self.storage.storage_stats()
    }

    pub fn clear_all_data(&mut self) {
        self.storage.clear_all();
        self.dispatch(WorkoutAction::LoadHistory(WorkoutHistory::new()));
    }

    /// Drive the maintenance schedule; returns true if maintenance ran
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        self.maintenance.run_if_due(&mut self.storage, now)
    }

    /// Run maintenance immediately, outside the schedule and even when the
    /// stored history is unreadable, so a backup can repair it
    ///
    /// Returns whether storage is healthy afterwards.
    pub fn run_maintenance(&mut self, now: DateTime<Utc>) -> bool {
        self.storage.perform_maintenance(now);
        self.storage.is_healthy()
    }
}
