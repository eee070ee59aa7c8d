//! Periodic storage maintenance.
//!
//! There is no background thread: whoever owns the event loop calls
//! [`MaintenanceSchedule::run_if_due`] and the schedule decides whether an
//! interval has elapsed since the last run.

use crate::storage::HistoryStorage;
use chrono::{DateTime, Duration, Utc};

/// Default time between maintenance runs
pub const DEFAULT_INTERVAL_MINUTES: i64 = 60;

#[derive(Clone, Debug)]
pub struct MaintenanceSchedule {
    interval: Duration,
    last_run: Option<DateTime<Utc>>,
}

impl Default for MaintenanceSchedule {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_INTERVAL_MINUTES))
    }
}

impl MaintenanceSchedule {
    /// A schedule whose first run is due immediately
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now - last >= self.interval,
        }
    }

    /// Run maintenance if an interval has elapsed and storage is healthy
    ///
    /// Returns true when maintenance ran. An unhealthy store still counts as
    /// a tick, so the next attempt waits a full interval.
    pub fn run_if_due<S: HistoryStorage + ?Sized>(&mut self, storage: &mut S, now: DateTime<Utc>) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.last_run = Some(now);

        if !storage.is_healthy() {
            tracing::warn!("Skipping scheduled maintenance, storage unhealthy");
            return false;
        }
        storage.perform_maintenance(now);
        tracing::debug!("Scheduled maintenance completed at {}", now);
        true
    }
}
