use crate::errors::{EngineError, EngineResult};
use crate::feed;
use crate::models::{EngineSettings, Notification};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Storage key holding the last reconciled feed as one serialized array.
const FEED_KEY: &str = "notification-feed";
const SETTINGS_KEY: &str = "engine-settings";

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: &Path) -> EngineResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| EngineError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(EngineError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(EngineError::from)?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.ensure_default_settings()?;
        Ok(db)
    }

    /// The prior feed for reconciliation. Missing or unreadable state degrades
    /// to an empty feed; it never fails a refresh cycle.
    pub fn load_feed(&self) -> EngineResult<Vec<Notification>> {
        match self.get(FEED_KEY)? {
            None => Ok(Vec::new()),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(feed) => Ok(feed),
                Err(error) => {
                    tracing::warn!(error = %error, "persisted feed is unreadable, treating prior feed as empty");
                    Ok(Vec::new())
                }
            },
        }
    }

    pub fn save_feed(&self, feed: &[Notification]) -> EngineResult<()> {
        let mut snapshot = feed.to_vec();
        feed::enforce_inactivity_visible(&mut snapshot);
        let value = serde_json::to_string(&snapshot)?;
        self.put(FEED_KEY, &value)
    }

    pub fn settings(&self) -> EngineResult<EngineSettings> {
        match self.get(SETTINGS_KEY)? {
            None => Ok(EngineSettings::default()),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => Ok(settings),
                Err(error) => {
                    tracing::warn!(error = %error, "stored settings are unreadable, falling back to defaults");
                    Ok(EngineSettings::default())
                }
            },
        }
    }

    pub fn update_settings(&self, settings: &EngineSettings) -> EngineResult<()> {
        let value = serde_json::to_string(settings)?;
        self.put(SETTINGS_KEY, &value)
    }

    fn ensure_default_settings(&self) -> EngineResult<()> {
        if self.get(SETTINGS_KEY)?.is_none() {
            self.update_settings(&EngineSettings::default())?;
        }
        Ok(())
    }

    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| EngineError::Internal("database mutex poisoned".to_string()))?;
        let value = conn
            .query_row("SELECT value FROM app_state WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> EngineResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| EngineError::Internal("database mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO app_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Database, FEED_KEY};
    use crate::models::{EngineSettings, Notification, NotificationKind, INACTIVITY_ALERT_ID};
    use chrono::Utc;

    fn open_temp_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db = Database::new(&dir.path().join("state.sqlite")).expect("open database");
        (dir, db)
    }

    fn record(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            kind: NotificationKind::System,
            title: "title".to_string(),
            message: "message".to_string(),
            read: false,
            archived: false,
            created_at: Utc::now(),
            action_url: None,
            action_label: None,
            metadata: None,
        }
    }

    #[test]
    fn missing_feed_loads_as_empty() {
        let (_dir, db) = open_temp_db();
        assert!(db.load_feed().expect("load").is_empty());
    }

    #[test]
    fn corrupt_feed_degrades_to_empty() {
        let (_dir, db) = open_temp_db();
        db.put(FEED_KEY, "{not json").expect("write corrupt value");
        assert!(db.load_feed().expect("load").is_empty());
    }

    #[test]
    fn saved_feed_round_trips() {
        let (_dir, db) = open_temp_db();
        let mut read_record = record("task-1");
        read_record.read = true;
        db.save_feed(&[read_record.clone()]).expect("save");

        let loaded = db.load_feed().expect("load");
        assert_eq!(loaded, vec![read_record]);
    }

    #[test]
    fn save_clears_an_archived_inactivity_alert() {
        let (_dir, db) = open_temp_db();
        let mut alert = record(INACTIVITY_ALERT_ID);
        alert.archived = true;
        db.save_feed(&[alert]).expect("save");

        let loaded = db.load_feed().expect("load");
        assert!(!loaded[0].archived);
    }

    #[test]
    fn settings_are_seeded_and_updatable() {
        let (_dir, db) = open_temp_db();
        let defaults = db.settings().expect("settings");
        assert_eq!(defaults.refresh_interval_secs, 300);
        assert_eq!(defaults.upcoming_window_days, 7);

        let updated = EngineSettings {
            refresh_interval_secs: 60,
            ..defaults
        };
        db.update_settings(&updated).expect("update");
        assert_eq!(db.settings().expect("settings").refresh_interval_secs, 60);
    }
}
