//! Core domain types for liftlog.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises (reference data supplied by a catalog)
//! - Sets, exercises-in-workout and workout sessions
//! - Partial updates to an in-progress session
//! - Derived statistics and storage diagnostics
//!
//! Field names serialize in camelCase so that persisted history and export
//! files stay readable by the browser build of the tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Exercise Types
// ============================================================================

/// An exercise from the static catalog (e.g. "Bench Press")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    #[serde(default)]
    pub equipment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<String>,
}

impl Exercise {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        muscle_group: impl Into<String>,
        equipment: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            muscle_group: muscle_group.into(),
            equipment: equipment.into(),
            description: None,
            instructions: Vec::new(),
        }
    }
}

// ============================================================================
// Set and Exercise-in-Workout Types
// ============================================================================

/// One logged set of an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSet {
    pub id: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WorkoutSet {
    /// Create a not-yet-completed set with a fresh id
    pub fn new(weight: f64, reps: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            weight: weight.max(0.0),
            reps,
            completed: false,
            notes: None,
        }
    }

    /// Weight moved by this set, counted only once it is completed
    pub fn volume(&self) -> f64 {
        if self.completed {
            self.weight * f64::from(self.reps)
        } else {
            0.0
        }
    }
}

/// An exercise as performed within one workout, with its ordered sets
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutExercise {
    pub exercise: Exercise,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
    /// Rest between sets, in seconds
    #[serde(default)]
    pub rest_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_reps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sets: Option<u32>,
}

impl WorkoutExercise {
    pub fn new(exercise: Exercise, rest_time: u32) -> Self {
        Self {
            exercise,
            sets: Vec::new(),
            rest_time,
            target_reps: None,
            target_sets: None,
        }
    }

    /// Append a set that starts from the previous set's weight and reps
    pub fn add_set(&mut self) -> &mut WorkoutSet {
        let (weight, reps) = self
            .sets
            .last()
            .map(|s| (s.weight, s.reps))
            .unwrap_or((0.0, 0));
        self.sets.push(WorkoutSet::new(weight, reps));
        let last = self.sets.len() - 1;
        &mut self.sets[last]
    }

    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }

    pub fn volume(&self) -> f64 {
        self.sets.iter().map(WorkoutSet::volume).sum()
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// A workout occurrence, in progress or finished
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_id: Option<String>,
    #[serde(default)]
    pub total_volume: f64,
    #[serde(default)]
    pub completed_sets: u32,
    #[serde(default)]
    pub total_sets: u32,
    /// Minutes between start and end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

impl WorkoutSession {
    /// Create an empty in-progress session whose id derives from its start time
    pub fn new(name: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            id: start_time.timestamp_millis().to_string(),
            name: name.into(),
            start_time,
            end_time: None,
            exercises: Vec::new(),
            notes: None,
            routine_id: None,
            total_volume: 0.0,
            completed_sets: 0,
            total_sets: 0,
            duration: None,
        }
    }

    /// Calendar date (`yyyy-MM-dd`, UTC) this session is filed under
    pub fn date_key(&self) -> String {
        date_key(&self.start_time)
    }

    /// Recompute the stored aggregates from the exercise and set data
    pub fn summarize(&mut self) {
        self.total_volume = self.exercises.iter().map(WorkoutExercise::volume).sum();
        self.completed_sets = self
            .exercises
            .iter()
            .map(|e| e.completed_sets() as u32)
            .sum();
        self.total_sets = self.exercises.iter().map(|e| e.sets.len() as u32).sum();
    }

    /// Stamp the end time, derive the duration and summarize
    pub fn finished_at(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self.duration = Some(duration_minutes(self.start_time, end_time));
        self.summarize();
        self
    }
}

/// Format a moment as the `yyyy-MM-dd` history key (UTC calendar date)
pub fn date_key(moment: &DateTime<Utc>) -> String {
    moment.format("%Y-%m-%d").to_string()
}

/// Whole minutes between two moments, rounded half away from zero
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds() as f64;
    (millis / 60_000.0).round() as i64
}

/// Partial fields merged into the current workout
///
/// `None` leaves the corresponding field untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPatch {
    pub name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub exercises: Option<Vec<WorkoutExercise>>,
    pub notes: Option<String>,
    pub routine_id: Option<String>,
    pub total_volume: Option<f64>,
    pub completed_sets: Option<u32>,
    pub total_sets: Option<u32>,
    pub duration: Option<i64>,
}

impl WorkoutPatch {
    pub fn apply(self, session: &mut WorkoutSession) {
        if let Some(name) = self.name {
            session.name = name;
        }
        if let Some(start_time) = self.start_time {
            session.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            session.end_time = Some(end_time);
        }
        if let Some(exercises) = self.exercises {
            session.exercises = exercises;
        }
        if let Some(notes) = self.notes {
            session.notes = Some(notes);
        }
        if let Some(routine_id) = self.routine_id {
            session.routine_id = Some(routine_id);
        }
        if let Some(total_volume) = self.total_volume {
            session.total_volume = total_volume;
        }
        if let Some(completed_sets) = self.completed_sets {
            session.completed_sets = completed_sets;
        }
        if let Some(total_sets) = self.total_sets {
            session.total_sets = total_sets;
        }
        if let Some(duration) = self.duration {
            session.duration = Some(duration);
        }
    }
}

// ============================================================================
// Derived Types
// ============================================================================

/// Aggregates derived from every session in history
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
    pub total_workouts: usize,
    pub total_volume: f64,
    /// Mean duration in whole minutes
    pub average_duration: i64,
    pub favorite_exercises: Vec<String>,
    pub muscle_group_focus: BTreeMap<String, usize>,
    /// Week-start date (Sunday, `yyyy-MM-dd`) to session count
    pub weekly_progress: BTreeMap<String, usize>,
}

/// Diagnostics about the durable copy of history
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_workouts: usize,
    pub total_dates: usize,
    pub last_save: Option<DateTime<Utc>>,
    pub backup_time: Option<DateTime<Utc>>,
    /// Approximate size of the serialized history, in bytes
    pub storage_size: usize,
}
