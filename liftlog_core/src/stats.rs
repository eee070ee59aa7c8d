//! Aggregate statistics over finished workouts.
//!
//! Stats are always recomputed from the full set of sessions; nothing here
//! is patched incrementally.

use crate::{date_key, WorkoutSession, WorkoutStats};
use chrono::{Datelike, Duration};
use std::collections::{BTreeMap, HashMap};

/// Number of names reported in `favorite_exercises`
pub const FAVORITE_EXERCISE_COUNT: usize = 5;

/// Compute stats for `sessions`
///
/// Favorites are ordered by occurrence count, descending; equal counts keep
/// the order in which the exercise was first seen while traversing
/// `sessions`.
pub fn calculate_stats<'a, I>(sessions: I) -> WorkoutStats
where
    I: IntoIterator<Item = &'a WorkoutSession>,
{
    let mut total_workouts = 0usize;
    let mut total_volume = 0.0;
    let mut duration_sum = 0i64;
    let mut duration_count = 0i64;

    // (name, count) in first-seen order, with an index for lookups
    let mut exercise_counts: Vec<(String, usize)> = Vec::new();
    let mut exercise_index: HashMap<String, usize> = HashMap::new();
    let mut muscle_group_focus: BTreeMap<String, usize> = BTreeMap::new();
    let mut weekly_progress: BTreeMap<String, usize> = BTreeMap::new();

    for session in sessions {
        total_workouts += 1;
        total_volume += session.total_volume;

        // Zero-length sessions carry no duration signal
        if let Some(minutes) = session.duration.filter(|m| *m != 0) {
            duration_sum += minutes;
            duration_count += 1;
        }

        for entry in &session.exercises {
            let name = &entry.exercise.name;
            match exercise_index.get(name) {
                Some(&i) => exercise_counts[i].1 += 1,
                None => {
                    exercise_index.insert(name.clone(), exercise_counts.len());
                    exercise_counts.push((name.clone(), 1));
                }
            }
            *muscle_group_focus
                .entry(entry.exercise.muscle_group.clone())
                .or_default() += 1;
        }

        *weekly_progress.entry(week_start_key(session)).or_default() += 1;
    }

    let average_duration = if duration_count > 0 {
        (duration_sum as f64 / duration_count as f64).round() as i64
    } else {
        0
    };

    // Stable sort keeps first-seen order among equal counts
    exercise_counts.sort_by(|a, b| b.1.cmp(&a.1));
    let favorite_exercises = exercise_counts
        .into_iter()
        .take(FAVORITE_EXERCISE_COUNT)
        .map(|(name, _)| name)
        .collect();

    WorkoutStats {
        total_workouts,
        total_volume,
        average_duration,
        favorite_exercises,
        muscle_group_focus,
        weekly_progress,
    }
}

/// Sunday of the week the session started in, as a history-style date key
pub fn week_start_key(session: &WorkoutSession) -> String {
    let offset = session.start_time.weekday().num_days_from_sunday();
    date_key(&(session.start_time - Duration::days(i64::from(offset))))
}
