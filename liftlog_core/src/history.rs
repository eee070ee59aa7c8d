//! Date-keyed workout history.
//!
//! History maps a calendar date (`yyyy-MM-dd`) to the sessions that started
//! on that date, in the order they were finished. A date is present only
//! while it has at least one session.

use crate::WorkoutSession;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// All finished sessions, bucketed by start date
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct WorkoutHistory(BTreeMap<String, Vec<WorkoutSession>>);

impl WorkoutHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct dates with at least one session
    pub fn date_count(&self) -> usize {
        self.0.len()
    }

    /// Number of sessions across all dates
    pub fn session_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn contains_date(&self, date: &str) -> bool {
        self.0.contains_key(date)
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Sessions filed under `date`; empty when the date is unknown
    pub fn on_date(&self, date: &str) -> &[WorkoutSession] {
        self.0.get(date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every session, oldest date first, finish order within a date
    pub fn sessions(&self) -> impl Iterator<Item = &WorkoutSession> {
        self.0.values().flatten()
    }

    /// (date, session) pairs in the same order as [`sessions`](Self::sessions)
    pub fn entries(&self) -> impl Iterator<Item = (&str, &WorkoutSession)> {
        self.0
            .iter()
            .flat_map(|(date, sessions)| sessions.iter().map(move |s| (date.as_str(), s)))
    }

    /// First session with `id`, scanning every date
    pub fn find(&self, id: &str) -> Option<&WorkoutSession> {
        self.sessions().find(|s| s.id == id)
    }

    /// Every session with `id`, mutably
    pub(crate) fn find_all_mut<'a>(
        &'a mut self,
        id: &'a str,
    ) -> impl Iterator<Item = &'a mut WorkoutSession> + 'a {
        self.0.values_mut().flatten().filter(move |s| s.id == id)
    }

    /// Append a finished session to the bucket for its start date
    pub fn push(&mut self, session: WorkoutSession) {
        self.0.entry(session.date_key()).or_default().push(session);
    }

    /// Remove sessions matching `id` from `date`, dropping the date once empty
    ///
    /// Returns true if anything was removed.
    pub fn remove(&mut self, date: &str, id: &str) -> bool {
        let Some(bucket) = self.0.get_mut(date) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|s| s.id != id);
        let removed = bucket.len() != before;
        if bucket.is_empty() {
            self.0.remove(date);
        }
        removed
    }
}

impl FromIterator<(String, Vec<WorkoutSession>)> for WorkoutHistory {
    fn from_iter<I: IntoIterator<Item = (String, Vec<WorkoutSession>)>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|(_, v)| !v.is_empty()).collect())
    }
}

// Empty buckets in stored data are dropped on the way in.
impl<'de> Deserialize<'de> for WorkoutHistory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let buckets = BTreeMap::<String, Vec<WorkoutSession>>::deserialize(deserializer)?;
        Ok(buckets.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn session(id: &str, day: u32, hour: u32) -> WorkoutSession {
        let mut s = WorkoutSession::new("Test", Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap());
        s.id = id.into();
        s
    }

    #[test]
    fn test_push_buckets_by_start_date() {
        let mut history = WorkoutHistory::new();
        history.push(session("a", 1, 8));
        history.push(session("b", 1, 18));
        history.push(session("c", 2, 8));

        assert_eq!(history.date_count(), 2);
        assert_eq!(history.session_count(), 3);
        let ids: Vec<_> = history.on_date("2024-01-01").iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_remove_last_session_drops_date() {
        let mut history = WorkoutHistory::new();
        history.push(session("a", 1, 8));

        assert!(history.remove("2024-01-01", "a"));
        assert!(!history.contains_date("2024-01-01"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut history = WorkoutHistory::new();
        history.push(session("a", 1, 8));

        assert!(!history.remove("2024-01-01", "zzz"));
        assert!(!history.remove("2030-01-01", "a"));
        assert_eq!(history.session_count(), 1);
    }

    #[test]
    fn test_find_scans_all_dates() {
        let mut history = WorkoutHistory::new();
        history.push(session("a", 1, 8));
        history.push(session("b", 3, 8));

        assert_eq!(history.find("b").map(|s| s.date_key()), Some("2024-01-03".into()));
        assert!(history.find("nope").is_none());
        assert!(history.on_date("2024-01-02").is_empty());
    }

    #[test]
    fn test_empty_buckets_are_not_collected() {
        let history: WorkoutHistory = vec![
            ("2024-01-01".to_string(), vec![]),
            ("2024-01-02".to_string(), vec![session("a", 2, 8)]),
        ]
        .into_iter()
        .collect();
        assert_eq!(history.date_count(), 1);
    }
}
