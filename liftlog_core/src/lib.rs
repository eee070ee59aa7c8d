#![forbid(unsafe_code)]

//! Core domain model and state management for the liftlog workout tracker.
//!
//! This crate provides:
//! - Domain types (exercises, sets, sessions, date-keyed history)
//! - Statistics and progress insights
//! - The reducer and the workout store (command/query surface)
//! - Durable storage with backup, import/export and maintenance

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod history;
pub mod kv;
pub mod storage;
pub mod stats;
pub mod progress;
pub mod reducer;
pub mod maintenance;
pub mod store;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use history::WorkoutHistory;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use storage::{HistoryStorage, WorkoutStorage};
pub use stats::calculate_stats;
pub use reducer::{reduce, WorkoutAction, WorkoutState};
pub use maintenance::MaintenanceSchedule;
pub use store::WorkoutStore;
