//! SQLite persistence for learning items
//!
//! Items live in the `items` table, their review log in `review_history`.
//! Stored history rows are only ever inserted, never updated, so the log
//! stays append-only on disk as well. `app_state` keeps a simulated clock
//! offset that can be advanced one day at a time to practise scheduling.

use crate::error::StoreError;
use crate::models::{ItemRecord, LearningItem, Rating, ReviewRecord};
use crate::store::{ItemStore, Loaded};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, params};
use std::path::Path;
use tracing::{info, warn};

const CLOCK_OFFSET_KEY: &str = "clock_offset_days";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        init_database(&conn)?;
        info!(path = %path.display(), "database opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn clock_offset_days(&self) -> Result<i64, StoreError> {
        let value: String = self.conn.query_row(
            "SELECT value FROM app_state WHERE key = ?1",
            params![CLOCK_OFFSET_KEY],
            |row| row.get(0),
        )?;
        value
            .parse()
            .map_err(|_| StoreError::InvalidRecord(format!("clock offset '{value}'")))
    }

    /// Moves the simulated clock forward by 24 hours.
    pub fn advance_day(&self) -> Result<DateTime<Utc>, StoreError> {
        let offset = self.clock_offset_days()? + 1;
        self.conn.execute(
            "UPDATE app_state SET value = ?1 WHERE key = ?2",
            params![offset.to_string(), CLOCK_OFFSET_KEY],
        )?;
        info!(offset_days = offset, "simulated clock advanced");
        self.current_time()
    }

    fn query_records(&self, id: Option<&str>) -> Result<Vec<ItemRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, prompt, answer, created_at, last_reviewed_at,
                    interval_days, repetition_count, ease_factor
             FROM items
             WHERE ?1 IS NULL OR id = ?1
             ORDER BY rowid",
        )?;

        let rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, Option<f64>>(7)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for (
            id,
            prompt,
            answer,
            created_at,
            last_reviewed_at,
            interval_days,
            repetition_count,
            ease_factor,
        ) in rows
        {
            let review_history = self.review_history(&id)?;
            records.push(ItemRecord {
                id,
                prompt,
                answer,
                created_at: created_at.as_deref().map(parse_timestamp).transpose()?,
                last_reviewed_at: last_reviewed_at.as_deref().map(parse_timestamp).transpose()?,
                interval_days,
                repetition_count,
                ease_factor,
                review_history,
            });
        }
        Ok(records)
    }

    fn review_history(&self, item_id: &str) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, rating, interval_before
             FROM review_history
             WHERE item_id = ?1
             ORDER BY seq ASC",
        )?;

        let rows = stmt
            .query_map(params![item_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(timestamp, rating, interval_before)| -> Result<ReviewRecord, StoreError> {
                let rating = u8::try_from(rating)
                    .ok()
                    .and_then(|value| Rating::try_from(value).ok())
                    .ok_or_else(|| {
                        StoreError::InvalidRecord(format!("rating {rating} of item {item_id}"))
                    })?;
                Ok(ReviewRecord {
                    timestamp: parse_timestamp(&timestamp)?,
                    rating,
                    interval_before: u32::try_from(interval_before.max(0)).unwrap_or(u32::MAX),
                })
            })
            .collect()
    }
}

/// Creates the tables for items, review history and app state.
pub fn init_database(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            prompt TEXT NOT NULL,
            answer TEXT NOT NULL,
            created_at TEXT,
            last_reviewed_at TEXT,
            interval_days INTEGER NOT NULL DEFAULT 1,
            repetition_count INTEGER NOT NULL DEFAULT 0,
            ease_factor REAL
        );

        CREATE TABLE IF NOT EXISTS review_history (
            item_id TEXT NOT NULL,
            seq INTEGER NOT NULL,
            timestamp TEXT NOT NULL,
            rating INTEGER NOT NULL,
            interval_before INTEGER NOT NULL,
            PRIMARY KEY (item_id, seq),
            FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES (?1, '0')",
        params![CLOCK_OFFSET_KEY],
    )?;

    Ok(())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidTimestamp(value.to_string()))
}

impl ItemStore for SqliteStore {
    fn load_all(&mut self) -> Result<Loaded, StoreError> {
        Ok(Loaded::from_records(self.query_records(None)?))
    }

    fn get(&mut self, id: &str) -> Result<Option<LearningItem>, StoreError> {
        Ok(Loaded::from_records(self.query_records(Some(id))?)
            .items
            .into_iter()
            .next())
    }

    fn put(&mut self, item: &LearningItem) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO items (id, prompt, answer, created_at, last_reviewed_at,
                                interval_days, repetition_count, ease_factor)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                prompt = excluded.prompt,
                answer = excluded.answer,
                created_at = excluded.created_at,
                last_reviewed_at = excluded.last_reviewed_at,
                interval_days = excluded.interval_days,
                repetition_count = excluded.repetition_count,
                ease_factor = excluded.ease_factor",
            params![
                item.id(),
                item.prompt(),
                item.answer(),
                item.created_at().map(|dt| dt.to_rfc3339()),
                item.last_reviewed_at().map(|dt| dt.to_rfc3339()),
                i64::from(item.interval_days()),
                i64::from(item.repetition_count()),
                item.ease_factor(),
            ],
        )?;

        let stored: i64 = tx.query_row(
            "SELECT COUNT(*) FROM review_history WHERE item_id = ?1",
            params![item.id()],
            |row| row.get(0),
        )?;
        let stored = usize::try_from(stored).unwrap_or(0);
        if item.review_history().len() < stored {
            warn!(
                id = item.id(),
                stored,
                given = item.review_history().len(),
                "item has fewer history entries than stored, keeping stored history"
            );
        }

        for (seq, record) in item.review_history().iter().enumerate().skip(stored) {
            tx.execute(
                "INSERT INTO review_history (item_id, seq, timestamp, rating, interval_before)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    item.id(),
                    seq as i64,
                    record.timestamp.to_rfc3339(),
                    record.rating.value(),
                    i64::from(record.interval_before),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM review_history WHERE item_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM items WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn current_time(&self) -> Result<DateTime<Utc>, StoreError> {
        Ok(Utc::now() + Duration::days(self.clock_offset_days()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Policy;

    #[test]
    fn test_put_and_load() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        let mut light = LearningItem::new("hello", "cześć", Policy::Light, now);
        light.rate(4, now).unwrap();
        let simple = LearningItem::new("goodbye", "do widzenia", Policy::Simple, now);

        store.put(&light).unwrap();
        store.put(&simple).unwrap();

        let loaded = store.load_all().unwrap();
        assert!(loaded.repairs.is_empty());
        assert_eq!(loaded.items, vec![light.clone(), simple]);
        assert_eq!(store.get(light.id()).unwrap(), Some(light));
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_history_is_appended() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        let mut item = LearningItem::new("q", "a", Policy::Simple, now);
        store.put(&item).unwrap();

        item.rate(3, now).unwrap();
        store.put(&item).unwrap();
        item.rate(4, now + Duration::days(3)).unwrap();
        store.put(&item).unwrap();

        let stored = store.get(item.id()).unwrap().unwrap();
        assert_eq!(stored.review_history().len(), 2);
        assert_eq!(stored.review_history(), item.review_history());
        assert_eq!(stored.interval_days(), 7);
    }

    #[test]
    fn test_stale_put_keeps_stored_history() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        let stale = LearningItem::new("q", "a", Policy::Simple, now);
        let mut rated = stale.clone();
        rated.rate(3, now).unwrap();

        store.put(&rated).unwrap();
        store.put(&stale).unwrap();

        let stored = store.get(stale.id()).unwrap().unwrap();
        assert_eq!(stored.review_history().len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut item = LearningItem::new("q", "a", Policy::Light, Utc::now());
        item.rate(2, Utc::now()).unwrap();
        store.put(&item).unwrap();

        assert!(store.get(item.id()).unwrap().is_some());
        assert!(store.remove(item.id()).unwrap());
        assert!(store.get(item.id()).unwrap().is_none());
        assert!(!store.remove(item.id()).unwrap());

        let orphaned: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM review_history", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphaned, 0);
    }

    #[test]
    fn test_corrupt_row_is_repaired_on_load() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO items (id, prompt, answer, interval_days, repetition_count, ease_factor)
                 VALUES ('broken', 'q', 'a', -2, 1, 0.4)",
                [],
            )
            .unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.repairs.len(), 2);
        assert_eq!(loaded.items[0].interval_days(), 1);
        assert_eq!(loaded.items[0].ease_factor(), Some(1.3));
    }

    #[test]
    fn test_advance_day() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.clock_offset_days().unwrap(), 0);

        let before = store.current_time().unwrap();
        let after = store.advance_day().unwrap();
        assert_eq!(store.clock_offset_days().unwrap(), 1);
        assert!(after - before >= Duration::days(1));
    }

    #[test]
    fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("items.sqlite3");
        let item = LearningItem::new("q", "a", Policy::Simple, Utc::now());
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.put(&item).unwrap();
        }
        let mut reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.load_all().unwrap().items, vec![item]);
    }
}
