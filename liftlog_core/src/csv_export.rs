//! Flat CSV export of every logged set.
//!
//! One row per set, for spreadsheets. This is a one-way export; JSON export
//! remains the format that can be imported back.

use crate::{Result, WorkoutHistory};
use std::io::Write;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct SetRow<'a> {
    date: &'a str,
    workout_id: &'a str,
    workout_name: &'a str,
    exercise: &'a str,
    muscle_group: &'a str,
    set_number: usize,
    weight: f64,
    reps: u32,
    completed: bool,
}

/// Write all sets in `history` as CSV with a header row
///
/// Returns the number of rows written.
pub fn write_sets_csv<W: Write>(history: &WorkoutHistory, writer: W) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    let mut rows = 0;
    for (date, session) in history.entries() {
        for entry in &session.exercises {
            for (i, set) in entry.sets.iter().enumerate() {
                writer.serialize(SetRow {
                    date,
                    workout_id: &session.id,
                    workout_name: &session.name,
                    exercise: &entry.exercise.name,
                    muscle_group: &entry.exercise.muscle_group,
                    set_number: i + 1,
                    weight: set.weight,
                    reps: set.reps,
                    completed: set.completed,
                })?;
                rows += 1;
            }
        }
    }

    writer.flush()?;
    tracing::info!("Wrote {} set rows to CSV", rows);
    Ok(rows)
}
