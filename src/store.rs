use std::collections::HashMap;
use std::path::PathBuf;
use once_cell::sync::Lazy;
use poise::serenity_prelude::GuildId;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use crate::err_sync;
use crate::error::WheelError;

/// The settings document. One JSON object, keyed by guild id.
pub const SETTINGS_PATH: &str = "settings.json";

/// Monday-first, to match [`chrono::Weekday::num_days_from_monday`].
pub const DAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// When a guild gets its scheduled announcement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Day of the week, Monday = 0.
    pub day: u8,
    /// Hour of the day, UTC.
    pub hour: u8,
}

impl ScheduleRecord {
    /// Human-readable rendering, e.g. ‘Friday at 18:00 UTC’.
    pub fn describe(&self) -> String {
        format!(
            "{} at {:02}:00 UTC",
            DAY_NAMES[usize::from(self.day.min(6))],
            self.hour
        )
    }

    fn validate(&self) -> Result<(), WheelError> {
        if self.day > 6 {
            return Err(WheelError::InvalidDay(self.day.to_string()));
        }
        if self.hour > 23 {
            return Err(WheelError::InvalidHour(i64::from(self.hour)));
        }
        Ok(())
    }
}

impl Default for ScheduleRecord {
    /// Fridays at midnight UTC.
    fn default() -> Self {
        Self { day: 4, hour: 0 }
    }
}

/// Per-guild slice of the settings document. Guilds that have never run
/// `setschedule` have no entry at all and get [`ScheduleRecord::default`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GuildEntry {
    #[serde(default)]
    pub schedule: ScheduleRecord,
}

type SettingsDocument = HashMap<String, GuildEntry>;

/// File-backed store for per-guild settings. Reads reload the document
/// every time; writes are whole-document read-modify-write cycles,
/// serialized through `write_lock` so two concurrent `setschedule`s can’t
/// clobber each other’s guilds.
pub struct ScheduleStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

static SETTINGS: Lazy<ScheduleStore> = Lazy::new(ScheduleStore::open);

impl ScheduleStore {
    pub fn open() -> Self {
        Self {
            path: PathBuf::from(SETTINGS_PATH),
            write_lock: Mutex::new(()),
        }
    }

    /// Store over a custom path, for tests.
    #[cfg(test)]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    /// Load the whole document. A missing or corrupt file yields an empty
    /// map, so every guild falls back to defaults until it is configured
    /// again; corruption is logged but never bubbles up to users.
    pub async fn load_all(&self) -> SettingsDocument {
        let Ok(raw) = tokio::fs::read_to_string(&self.path).await else {
            return SettingsDocument::new();
        };

        match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                err_sync!("Settings file is corrupt, treating it as empty: {}", e);
                SettingsDocument::new()
            }
        }
    }

    pub async fn get(&self, guild: GuildId) -> ScheduleRecord {
        self.load_all()
            .await
            .get(&guild.to_string())
            .map(|entry| entry.schedule)
            .unwrap_or_default()
    }

    /// Insert or replace `guild`’s schedule and write the document back.
    /// The record is validated here as well, even though command handlers
    /// check their arguments first; the file must never hold an
    /// out-of-range slot.
    pub async fn set(&self, guild: GuildId, record: ScheduleRecord) -> Result<(), WheelError> {
        record.validate()?;

        let _guard = self.write_lock.lock().await;
        let mut doc = self.load_all().await;
        doc.entry(guild.to_string()).or_default().schedule = record;

        // Write to the side and rename so a crash mid-write can’t leave a
        // truncated document behind.
        let json = serde_json::to_string_pretty(&doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Schedule for a guild, or the default if it has none.
pub async fn get_schedule(guild: GuildId) -> ScheduleRecord {
    SETTINGS.get(guild).await
}

/// Persist a new schedule for a guild.
pub async fn set_schedule(guild: GuildId, record: ScheduleRecord) -> Result<(), WheelError> {
    SETTINGS.set(guild, record).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ScheduleStore {
        ScheduleStore::with_path(dir.path().join("settings.json"))
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.get(GuildId::new(123)).await, ScheduleRecord::default());
        assert_eq!(store.get(GuildId::new(123)).await, ScheduleRecord { day: 4, hour: 0 });
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let record = ScheduleRecord { day: 2, hour: 19 };
        store.set(GuildId::new(123), record).await.unwrap();
        assert_eq!(store.get(GuildId::new(123)).await, record);
    }

    #[tokio::test]
    async fn writes_preserve_other_guilds() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set(GuildId::new(1), ScheduleRecord { day: 0, hour: 8 }).await.unwrap();
        store.set(GuildId::new(2), ScheduleRecord { day: 6, hour: 23 }).await.unwrap();
        assert_eq!(store.get(GuildId::new(1)).await, ScheduleRecord { day: 0, hour: 8 });
        assert_eq!(store.get(GuildId::new(2)).await, ScheduleRecord { day: 6, hour: 23 });
    }

    #[tokio::test]
    async fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = ScheduleStore::with_path(&path);
        assert_eq!(store.get(GuildId::new(123)).await, ScheduleRecord::default());

        // And a subsequent write starts over from an empty document.
        store.set(GuildId::new(123), ScheduleRecord { day: 1, hour: 1 }).await.unwrap();
        assert_eq!(store.get(GuildId::new(123)).await, ScheduleRecord { day: 1, hour: 1 });
    }

    #[tokio::test]
    async fn out_of_range_records_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.set(GuildId::new(5), ScheduleRecord { day: 7, hour: 0 }).await.is_err());
        assert!(store.set(GuildId::new(5), ScheduleRecord { day: 0, hour: 24 }).await.is_err());
        // Nothing was persisted.
        assert_eq!(store.get(GuildId::new(5)).await, ScheduleRecord::default());
    }

    #[tokio::test]
    async fn document_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"123": {"schedule": {"day": 4, "hour": 18}}}"#).unwrap();

        let store = ScheduleStore::with_path(&path);
        assert_eq!(store.get(GuildId::new(123)).await, ScheduleRecord { day: 4, hour: 18 });
        assert_eq!(store.get(GuildId::new(456)).await, ScheduleRecord::default());
    }

    #[test]
    fn describe_names_the_day() {
        assert_eq!(ScheduleRecord { day: 4, hour: 18 }.describe(), "Friday at 18:00 UTC");
        assert_eq!(ScheduleRecord::default().describe(), "Friday at 00:00 UTC");
    }
}
