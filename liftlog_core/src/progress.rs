//! Progress insights derived from history: personal records, streaks and
//! per-day volume.

use crate::WorkoutHistory;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Heaviest completed set ever logged for an exercise
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecord {
    pub exercise: String,
    pub weight: f64,
    pub reps: u32,
    pub date: String,
}

/// Personal records by exercise name, sorted by name
///
/// Only completed sets count. On equal weight the earliest set wins.
pub fn personal_records(history: &WorkoutHistory) -> Vec<PersonalRecord> {
    let mut records: BTreeMap<&str, PersonalRecord> = BTreeMap::new();

    for (date, session) in history.entries() {
        for entry in &session.exercises {
            let name = entry.exercise.name.as_str();
            for set in entry.sets.iter().filter(|s| s.completed) {
                let beats = records.get(name).map_or(true, |r| set.weight > r.weight);
                if beats {
                    records.insert(
                        name,
                        PersonalRecord {
                            exercise: name.to_string(),
                            weight: set.weight,
                            reps: set.reps,
                            date: date.to_string(),
                        },
                    );
                }
            }
        }
    }

    records.into_values().collect()
}

/// Consecutive days with at least one workout, ending today
///
/// A streak still counts if the most recent workout was yesterday.
pub fn current_streak(history: &WorkoutHistory, today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = history
        .dates()
        .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .collect();

    let mut day = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

/// Total stored volume of the sessions filed under `date`
pub fn volume_for_date(history: &WorkoutHistory, date: &str) -> f64 {
    history.on_date(date).iter().map(|s| s.total_volume).sum()
}
