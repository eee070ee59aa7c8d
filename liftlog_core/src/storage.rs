//! Durable workout history with a one-generation backup.
//!
//! Every write first copies the previous durable history into a backup key,
//! so a failed or corrupted write can fall back one generation. Read paths
//! never fail: they fall back to the backup and then to an empty history.

use crate::kv::KeyValueStore;
use crate::{Error, Result, StorageStats, WorkoutHistory};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Format version written alongside the history and into export files
pub const CURRENT_VERSION: &str = "1.0.0";

/// Backups older than this are dropped during maintenance
pub const BACKUP_RETENTION_DAYS: i64 = 7;

/// Keys in the durable store. Internal bookkeeping never shares a key with
/// application data.
pub mod keys {
    pub const HISTORY: &str = "liftlog_workoutHistory";
    pub const BACKUP: &str = "liftlog_backup";
    pub const VERSION: &str = "liftlog_version";
    pub const LAST_SAVE: &str = "liftlog_lastSave";
    pub const BACKUP_TIME: &str = "liftlog_backupTime";
    /// Key used by releases before the backup scheme existed
    pub const LEGACY_HISTORY: &str = "workoutHistory";
}

/// Persistence operations the workout store depends on
pub trait HistoryStorage {
    /// Persist `history`, keeping the previous generation as backup
    fn save_history(&mut self, history: &WorkoutHistory);

    /// Read history, falling back to the backup and then to empty
    fn load_history(&self) -> WorkoutHistory;

    /// Versioned, portable JSON document of the whole history
    fn export_history(&self) -> String;

    /// Replace history with an exported document; false if rejected
    fn import_history(&mut self, blob: &str) -> bool;

    /// Remove history, backup and all bookkeeping keys
    fn clear_all(&mut self);

    fn storage_stats(&self) -> StorageStats;

    /// True when the durable history is absent or parses cleanly
    fn is_healthy(&self) -> bool;

    /// Refresh backup, self-heal and prune backups older than the
    /// retention window as seen from `now`
    fn perform_maintenance(&mut self, now: DateTime<Utc>);
}

/// Shape of an export file
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument {
    version: String,
    export_date: DateTime<Utc>,
    workout_history: WorkoutHistory,
}

/// Storage service over any [`KeyValueStore`]
#[derive(Debug)]
pub struct WorkoutStorage<K: KeyValueStore> {
    kv: K,
}

impl<K: KeyValueStore> WorkoutStorage<K> {
    /// Wrap `kv`, migrating legacy data and stamping the format version
    pub fn new(kv: K) -> Self {
        let mut storage = Self { kv };
        storage.initialize();
        storage
    }

    /// Access the underlying medium
    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut K {
        &mut self.kv
    }

    pub fn into_inner(self) -> K {
        self.kv
    }

    fn initialize(&mut self) {
        if let Err(e) = self.migrate_legacy() {
            tracing::error!("Failed to migrate legacy workout data: {}", e);
        }
        if let Err(e) = self.kv.set(keys::VERSION, CURRENT_VERSION) {
            tracing::error!("Storage initialization failed: {}", e);
        }
    }

    fn migrate_legacy(&mut self) -> Result<()> {
        let Some(legacy) = self.kv.get(keys::LEGACY_HISTORY)? else {
            return Ok(());
        };
        if self.kv.get(keys::HISTORY)?.is_some() {
            return Ok(());
        }

        let history: WorkoutHistory = serde_json::from_str(&legacy)?;
        self.try_save(&history)?;
        self.kv.remove(keys::LEGACY_HISTORY)?;
        tracing::info!(
            "Migrated {} legacy workouts to current storage",
            history.session_count()
        );
        Ok(())
    }

    /// Copy the current durable history into the backup slot
    ///
    /// Skipped when there is nothing to back up or the current value does
    /// not parse, so a corrupted write never displaces a good backup.
    fn create_backup(&mut self, now: DateTime<Utc>) -> Result<()> {
        let Some(current) = self.kv.get(keys::HISTORY)? else {
            return Ok(());
        };
        if let Err(e) = serde_json::from_str::<WorkoutHistory>(&current) {
            tracing::warn!("Current history unreadable, keeping previous backup: {}", e);
            return Ok(());
        }
        self.kv.set(keys::BACKUP, &current)?;
        self.kv.set(keys::BACKUP_TIME, &timestamp(now))?;
        tracing::debug!("Backed up {} bytes of workout history", current.len());
        Ok(())
    }

    fn read_backup(&self) -> Result<Option<WorkoutHistory>> {
        match self.kv.get(keys::BACKUP)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn restore_from_backup(&self) -> WorkoutHistory {
        match self.read_backup() {
            Ok(Some(history)) => {
                tracing::info!("Restoring workout data from backup");
                history
            }
            Ok(None) => WorkoutHistory::new(),
            Err(e) => {
                tracing::error!("Failed to restore from backup: {}", e);
                WorkoutHistory::new()
            }
        }
    }

    /// Write the backup generation back into the history key
    fn write_back_backup(&mut self) -> Result<()> {
        if let Some(raw) = self.kv.get(keys::BACKUP)? {
            serde_json::from_str::<WorkoutHistory>(&raw)?;
            self.kv.set(keys::HISTORY, &raw)?;
            tracing::info!("Restored durable history from backup");
        }
        Ok(())
    }

    /// Back up, then write `history`
    ///
    /// A failed backup does not stop the save. The backup is only written
    /// back over the history key when the history write itself failed and
    /// the backup holds the generation that write was replacing.
    fn try_save(&mut self, history: &WorkoutHistory) -> Result<()> {
        let now = Utc::now();
        let backed_up = match self.create_backup(now) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to create backup, saving without one: {}", e);
                false
            }
        };

        let json = serde_json::to_string(history)?;
        if let Err(e) = self.kv.set(keys::HISTORY, &json) {
            if backed_up {
                if let Err(restore) = self.write_back_backup() {
                    tracing::error!("Failed to restore from backup: {}", restore);
                }
            }
            return Err(e);
        }

        if let Err(e) = self.kv.set(keys::LAST_SAVE, &timestamp(now)) {
            tracing::warn!("Failed to record save time: {}", e);
        }
        tracing::debug!("Saved {} workouts", history.session_count());
        Ok(())
    }

    fn try_load(&self) -> Result<WorkoutHistory> {
        match self.kv.get(keys::HISTORY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(WorkoutHistory::new()),
        }
    }

    fn try_export(&self) -> Result<String> {
        let document = ExportDocument {
            version: CURRENT_VERSION.to_string(),
            export_date: Utc::now(),
            workout_history: self.load_history(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn try_import(&mut self, blob: &str) -> Result<usize> {
        let history = parse_import(blob)?;
        self.try_save(&history)?;
        Ok(history.session_count())
    }

    fn try_clear(&mut self) -> Result<()> {
        for key in [
            keys::HISTORY,
            keys::BACKUP,
            keys::VERSION,
            keys::LAST_SAVE,
            keys::BACKUP_TIME,
        ] {
            self.kv.remove(key)?;
        }
        Ok(())
    }

    fn try_stats(&self) -> Result<StorageStats> {
        let history = self.load_history();
        let storage_size = serde_json::to_string(&history)?.len();
        Ok(StorageStats {
            total_workouts: history.session_count(),
            total_dates: history.date_count(),
            last_save: self.kv.get(keys::LAST_SAVE)?.as_deref().and_then(parse_timestamp),
            backup_time: self.kv.get(keys::BACKUP_TIME)?.as_deref().and_then(parse_timestamp),
            storage_size,
        })
    }

    fn try_maintain(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.create_backup(now)?;

        if !self.is_healthy() {
            tracing::warn!("Storage unhealthy, attempting repair");
            self.write_back_backup()?;
        }

        let backup_time = self.kv.get(keys::BACKUP_TIME)?;
        if let Some(taken) = backup_time.as_deref().and_then(parse_timestamp) {
            if taken < now - Duration::days(BACKUP_RETENTION_DAYS) {
                self.kv.remove(keys::BACKUP)?;
                self.kv.remove(keys::BACKUP_TIME)?;
                tracing::info!("Cleaned up backup taken at {}", taken);
            }
        }
        Ok(())
    }
}

impl<K: KeyValueStore> HistoryStorage for WorkoutStorage<K> {
    fn save_history(&mut self, history: &WorkoutHistory) {
        if let Err(e) = self.try_save(history) {
            tracing::error!("Failed to save workout history: {}", e);
        }
    }

    fn load_history(&self) -> WorkoutHistory {
        match self.try_load() {
            Ok(history) => history,
            Err(e) => {
                tracing::error!("Failed to load workout history: {}", e);
                self.restore_from_backup()
            }
        }
    }

    fn export_history(&self) -> String {
        match self.try_export() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to export workout data: {}", e);
                "{}".to_string()
            }
        }
    }

    fn import_history(&mut self, blob: &str) -> bool {
        match self.try_import(blob) {
            Ok(count) => {
                tracing::info!("Imported {} workouts", count);
                true
            }
            Err(e) => {
                tracing::error!("Failed to import workout data: {}", e);
                false
            }
        }
    }

    fn clear_all(&mut self) {
        if let Err(e) = self.try_clear() {
            tracing::error!("Failed to clear workout data: {}", e);
        }
    }

    fn storage_stats(&self) -> StorageStats {
        self.try_stats().unwrap_or_else(|e| {
            tracing::error!("Failed to get storage stats: {}", e);
            StorageStats::default()
        })
    }

    fn is_healthy(&self) -> bool {
        match self.kv.get(keys::HISTORY) {
            Ok(None) => true,
            Ok(Some(raw)) => match serde_json::from_str::<WorkoutHistory>(&raw) {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!("Storage health check failed: {}", e);
                    false
                }
            },
            Err(e) => {
                tracing::warn!("Storage health check failed: {}", e);
                false
            }
        }
    }

    fn perform_maintenance(&mut self, now: DateTime<Utc>) {
        if let Err(e) = self.try_maintain(now) {
            tracing::error!("Storage maintenance failed: {}", e);
        }
    }
}

/// Validate an export document and extract its history
///
/// The document must be JSON with an object-typed `workoutHistory` field
/// holding well-formed sessions.
pub fn parse_import(blob: &str) -> Result<WorkoutHistory> {
    let mut value: serde_json::Value = serde_json::from_str(blob)?;
    let history = match value.get_mut("workoutHistory") {
        Some(h) if h.is_object() => h.take(),
        _ => return Err(Error::Import("Invalid import data format".into())),
    };
    serde_json::from_value(history)
        .map_err(|e| Error::Import(format!("Invalid workout history: {}", e)))
}

fn timestamp(moment: DateTime<Utc>) -> String {
    moment.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use crate::WorkoutSession;
    use chrono::TimeZone;
    use std::collections::HashSet;

    /// Memory store whose writes to selected keys fail
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: HashSet<String>,
    }

    impl FlakyStore {
        fn fail_writes_to(&mut self, key: &str) {
            self.failing.insert(key.to_string());
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if self.failing.contains(key) {
                return Err(Error::Storage(format!("quota exceeded writing {}", key)));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    fn session(id: &str, day: u32, volume: f64) -> WorkoutSession {
        let start = Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap();
        let mut s = WorkoutSession::new("Full Body", start);
        s.id = id.into();
        s.total_volume = volume;
        s.finished_at(start + Duration::minutes(60))
    }

    fn history_of(sessions: Vec<WorkoutSession>) -> WorkoutHistory {
        let mut history = WorkoutHistory::new();
        for s in sessions {
            history.push(s);
        }
        history
    }

    fn memory_storage() -> WorkoutStorage<MemoryStore> {
        WorkoutStorage::new(MemoryStore::new())
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        crate::logging::init_test();
        let mut storage = memory_storage();
        assert!(storage.load_history().is_empty());

        let history = history_of(vec![session("w1", 1, 0.0), session("w2", 2, 0.0)]);
        storage.save_history(&history);

        assert_eq!(storage.load_history(), history);
    }

    #[test]
    fn test_new_stamps_version() {
        let storage = memory_storage();
        assert_eq!(
            storage.kv().get(keys::VERSION).unwrap(),
            Some(CURRENT_VERSION.into())
        );
    }

    #[test]
    fn test_save_keeps_previous_generation_as_backup() {
        let mut storage = memory_storage();
        let h1 = history_of(vec![session("w1", 1, 0.0)]);
        let h2 = history_of(vec![session("w1", 1, 0.0), session("w2", 2, 0.0)]);

        storage.save_history(&h1);
        assert_eq!(storage.kv().get(keys::BACKUP).unwrap(), None);

        storage.save_history(&h2);
        let backup: WorkoutHistory =
            serde_json::from_str(&storage.kv().get(keys::BACKUP).unwrap().unwrap()).unwrap();
        assert_eq!(backup, h1);
        assert!(storage.kv().get(keys::BACKUP_TIME).unwrap().is_some());
    }

    #[test]
    fn test_failed_write_keeps_previous_history() {
        let mut storage = WorkoutStorage::new(FlakyStore::default());
        let h1 = history_of(vec![session("w1", 1, 0.0)]);
        let h2 = history_of(vec![session("w2", 2, 0.0)]);

        storage.save_history(&h1);
        storage.kv_mut().fail_writes_to(keys::HISTORY);
        storage.save_history(&h2);

        assert_eq!(storage.load_history(), h1);
    }

    #[test]
    fn test_corrupted_history_falls_back_to_backup() {
        let mut storage = memory_storage();
        let h1 = history_of(vec![session("w1", 1, 0.0)]);
        storage.save_history(&h1);
        storage.save_history(&history_of(vec![session("w2", 2, 0.0)]));

        storage.kv_mut().set(keys::HISTORY, "{ invalid json }}}").unwrap();

        assert!(!storage.is_healthy());
        assert_eq!(storage.load_history(), h1);
    }

    #[test]
    fn test_corrupted_history_and_backup_loads_empty() {
        let mut storage = memory_storage();
        storage.kv_mut().set(keys::HISTORY, "not json").unwrap();
        storage.kv_mut().set(keys::BACKUP, "also not json").unwrap();

        assert!(storage.load_history().is_empty());
    }

    #[test]
    fn test_missing_history_ignores_backup() {
        let mut storage = memory_storage();
        let h1 = history_of(vec![session("w1", 1, 0.0)]);
        storage
            .kv_mut()
            .set(keys::BACKUP, &serde_json::to_string(&h1).unwrap())
            .unwrap();

        assert!(storage.load_history().is_empty());
        assert!(storage.is_healthy());
    }

    #[test]
    fn test_corrupted_current_never_replaces_backup() {
        let mut storage = memory_storage();
        let h1 = history_of(vec![session("w1", 1, 0.0)]);
        storage.save_history(&h1);
        storage.save_history(&h1);
        storage.kv_mut().set(keys::HISTORY, "garbage").unwrap();

        let h3 = history_of(vec![session("w3", 3, 0.0)]);
        storage.save_history(&h3);

        let backup: WorkoutHistory =
            serde_json::from_str(&storage.kv().get(keys::BACKUP).unwrap().unwrap()).unwrap();
        assert_eq!(backup, h1);
        assert_eq!(storage.load_history(), h3);
    }

    #[test]
    fn test_export_document_shape() {
        let mut storage = memory_storage();
        storage.save_history(&history_of(vec![session("w1", 1, 5000.0)]));

        let exported = storage.export_history();
        let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(value["version"], CURRENT_VERSION);
        assert!(value["exportDate"].is_string());
        assert_eq!(value["workoutHistory"]["2024-01-01"][0]["id"], "w1");
        assert_eq!(
            value["workoutHistory"]["2024-01-01"][0]["startTime"],
            "2024-01-01T10:00:00Z"
        );
    }

    #[test]
    fn test_export_import_roundtrip_into_cleared_store() {
        let mut storage = memory_storage();
        let history = history_of(vec![session("w1", 1, 5000.0), session("w2", 8, 1200.5)]);
        storage.save_history(&history);
        let exported = storage.export_history();

        storage.clear_all();
        assert!(storage.load_history().is_empty());

        assert!(storage.import_history(&exported));
        assert_eq!(storage.load_history(), history);
    }

    #[test]
    fn test_import_rejects_missing_history() {
        let mut storage = memory_storage();
        let history = history_of(vec![session("w1", 1, 0.0)]);
        storage.save_history(&history);

        assert!(!storage.import_history(r#"{"foo": 1}"#));
        assert!(!storage.import_history(r#"{"workoutHistory": [1, 2]}"#));
        assert!(!storage.import_history(r#"{"workoutHistory": "x"}"#));
        assert!(!storage.import_history("not json at all"));
        assert!(!storage.import_history(
            r#"{"workoutHistory": {"2024-01-01": [{"name": "no id or start"}]}}"#
        ));

        assert_eq!(storage.load_history(), history);
    }

    #[test]
    fn test_import_backs_up_current_state() {
        let mut storage = memory_storage();
        let before = history_of(vec![session("w1", 1, 0.0)]);
        storage.save_history(&before);

        let doc = r#"{"workoutHistory": {"2024-02-01": [
            {"id": "x", "name": "Imported", "startTime": "2024-02-01T07:00:00.000Z",
             "exercises": [], "totalVolume": 10, "completedSets": 1, "totalSets": 1}
        ]}}"#;
        assert!(storage.import_history(doc));

        let backup: WorkoutHistory =
            serde_json::from_str(&storage.kv().get(keys::BACKUP).unwrap().unwrap()).unwrap();
        assert_eq!(backup, before);
        assert_eq!(storage.load_history().on_date("2024-02-01")[0].id, "x");
    }

    #[test]
    fn test_import_reports_failed_write() {
        let mut storage = WorkoutStorage::new(FlakyStore::default());
        storage.kv_mut().fail_writes_to(keys::HISTORY);

        let doc = r#"{"workoutHistory": {}}"#;
        assert!(!storage.import_history(doc));
    }

    #[test]
    fn test_clear_all_is_idempotent() {
        let mut storage = memory_storage();
        storage.save_history(&history_of(vec![session("w1", 1, 0.0)]));
        storage.save_history(&history_of(vec![session("w1", 1, 0.0)]));

        storage.clear_all();
        assert!(storage.kv().is_empty());
        storage.clear_all();
        assert!(storage.kv().is_empty());
        assert_eq!(storage.storage_stats().total_workouts, 0);
    }

    #[test]
    fn test_storage_stats() {
        let mut storage = memory_storage();
        let empty = storage.storage_stats();
        assert_eq!(empty.total_workouts, 0);
        assert!(empty.last_save.is_none());
        assert_eq!(empty.storage_size, 2);

        let history = history_of(vec![
            session("w1", 1, 0.0),
            session("w2", 1, 0.0),
            session("w3", 2, 0.0),
        ]);
        storage.save_history(&history);

        let stats = storage.storage_stats();
        assert_eq!(stats.total_workouts, 3);
        assert_eq!(stats.total_dates, 2);
        assert!(stats.last_save.is_some());
        assert!(stats.backup_time.is_none());
        assert_eq!(stats.storage_size, serde_json::to_string(&history).unwrap().len());
    }

    #[test]
    fn test_legacy_data_is_migrated_once() {
        let history = history_of(vec![session("old", 1, 0.0)]);
        let mut kv = MemoryStore::new();
        kv.set(keys::LEGACY_HISTORY, &serde_json::to_string(&history).unwrap())
            .unwrap();

        let storage = WorkoutStorage::new(kv);
        assert_eq!(storage.load_history(), history);
        assert_eq!(storage.kv().get(keys::LEGACY_HISTORY).unwrap(), None);

        // A second start finds nothing to migrate
        let storage = WorkoutStorage::new(storage.into_inner());
        assert_eq!(storage.load_history(), history);
    }

    #[test]
    fn test_legacy_data_does_not_overwrite_current() {
        let current = history_of(vec![session("new", 2, 0.0)]);
        let legacy = history_of(vec![session("old", 1, 0.0)]);
        let mut kv = MemoryStore::new();
        kv.set(keys::HISTORY, &serde_json::to_string(&current).unwrap())
            .unwrap();
        kv.set(keys::LEGACY_HISTORY, &serde_json::to_string(&legacy).unwrap())
            .unwrap();

        let storage = WorkoutStorage::new(kv);
        assert_eq!(storage.load_history(), current);
        assert!(storage.kv().get(keys::LEGACY_HISTORY).unwrap().is_some());
    }

    #[test]
    fn test_unparseable_legacy_data_is_left_alone() {
        let mut kv = MemoryStore::new();
        kv.set(keys::LEGACY_HISTORY, "{{{").unwrap();

        let storage = WorkoutStorage::new(kv);
        assert!(storage.load_history().is_empty());
        assert_eq!(
            storage.kv().get(keys::VERSION).unwrap(),
            Some(CURRENT_VERSION.into())
        );
    }

    #[test]
    fn test_maintenance_refreshes_backup() {
        let mut storage = memory_storage();
        let history = history_of(vec![session("w1", 1, 0.0)]);
        storage.save_history(&history);

        storage.perform_maintenance(Utc::now());

        let backup: WorkoutHistory =
            serde_json::from_str(&storage.kv().get(keys::BACKUP).unwrap().unwrap()).unwrap();
        assert_eq!(backup, history);
    }

    #[test]
    fn test_maintenance_self_heals_from_backup() {
        let mut storage = memory_storage();
        let history = history_of(vec![session("w1", 1, 0.0)]);
        storage.save_history(&history);
        storage.save_history(&history);
        storage.kv_mut().set(keys::HISTORY, "corrupt").unwrap();

        storage.perform_maintenance(Utc::now());

        assert!(storage.is_healthy());
        assert_eq!(storage.try_load().unwrap(), history);
    }

    #[test]
    fn test_maintenance_prunes_stale_backup() {
        let mut storage = memory_storage();
        let history = history_of(vec![session("w1", 1, 0.0)]);
        storage
            .kv_mut()
            .set(keys::BACKUP, &serde_json::to_string(&history).unwrap())
            .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        storage
            .kv_mut()
            .set(keys::BACKUP_TIME, &timestamp(now - Duration::days(8)))
            .unwrap();

        storage.perform_maintenance(now);

        assert_eq!(storage.kv().get(keys::BACKUP).unwrap(), None);
        assert_eq!(storage.kv().get(keys::BACKUP_TIME).unwrap(), None);
    }

    #[test]
    fn test_maintenance_keeps_recent_backup() {
        let mut storage = memory_storage();
        storage.kv_mut().set(keys::BACKUP, "{}").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        storage
            .kv_mut()
            .set(keys::BACKUP_TIME, &timestamp(now - Duration::days(6)))
            .unwrap();

        storage.perform_maintenance(now);

        assert_eq!(storage.kv().get(keys::BACKUP).unwrap(), Some("{}".into()));
    }

    #[test]
    fn test_failed_backup_does_not_roll_back_history() {
        let mut storage = WorkoutStorage::new(FlakyStore::default());
        let h0 = history_of(vec![session("w1", 1, 0.0)]);
        let h1 = history_of(vec![session("w1", 1, 0.0), session("w2", 2, 0.0)]);
        let h2 = history_of(vec![
            session("w1", 1, 0.0),
            session("w2", 2, 0.0),
            session("w3", 3, 0.0),
        ]);

        storage.save_history(&h0);
        storage.save_history(&h1);
        storage.kv_mut().fail_writes_to(keys::BACKUP);
        storage.save_history(&h2);

        let loaded = storage.load_history();
        assert_ne!(loaded, h0);
        assert_eq!(loaded, h2);
    }

    #[test]
    fn test_failed_backup_and_history_write_keeps_previous_state() {
        let mut storage = WorkoutStorage::new(FlakyStore::default());
        let h0 = history_of(vec![session("w1", 1, 0.0)]);
        let h1 = history_of(vec![session("w1", 1, 0.0), session("w2", 2, 0.0)]);

        storage.save_history(&h0);
        storage.save_history(&h1);
        storage.kv_mut().fail_writes_to(keys::BACKUP);
        storage.kv_mut().fail_writes_to(keys::HISTORY);
        storage.save_history(&history_of(vec![session("w3", 3, 0.0)]));

        assert_eq!(storage.load_history(), h1);
    }

    #[test]
    fn test_failed_save_time_still_saves() {
        let mut storage = WorkoutStorage::new(FlakyStore::default());
        storage.kv_mut().fail_writes_to(keys::LAST_SAVE);
        let history = history_of(vec![session("w1", 1, 0.0)]);

        storage.save_history(&history);

        assert_eq!(storage.load_history(), history);
    }

    #[test]
    fn test_maintenance_backup_time_uses_given_clock() {
        let mut storage = memory_storage();
        storage.save_history(&history_of(vec![session("w1", 1, 0.0)]));
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        storage.perform_maintenance(now);

        assert_eq!(storage.storage_stats().backup_time, Some(now));
    }
}
