//! SQLite-backed revision store.

use crate::error::{StoreError, StoreResult};
use crate::models::{ItemId, Outcome, ReviewEvent, RevisionItem};
use crate::store::RevisionStore;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use std::path::Path;
use uuid::Uuid;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS revision_items (
                item_id INTEGER PRIMARY KEY,
                memorized INTEGER NOT NULL,
                memorized_at TEXT,
                last_reviewed_at TEXT,
                next_due_at TEXT,
                interval_days INTEGER NOT NULL,
                ease_factor REAL NOT NULL,
                learning_step INTEGER NOT NULL,
                consecutive_correct INTEGER NOT NULL DEFAULT 0,
                lapse_count INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS review_events (
                id TEXT PRIMARY KEY,
                item_id INTEGER NOT NULL,
                occurred_at TEXT NOT NULL,
                outcome TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_item ON review_events(item_id);
            "#,
        )?;
        Ok(())
    }
}

const UPSERT_ITEM: &str = "INSERT INTO revision_items (item_id, memorized, memorized_at, last_reviewed_at,
        next_due_at, interval_days, ease_factor, learning_step, consecutive_correct, lapse_count)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
     ON CONFLICT(item_id) DO UPDATE SET
        memorized = excluded.memorized, memorized_at = excluded.memorized_at,
        last_reviewed_at = excluded.last_reviewed_at, next_due_at = excluded.next_due_at,
        interval_days = excluded.interval_days, ease_factor = excluded.ease_factor,
        learning_step = excluded.learning_step, consecutive_correct = excluded.consecutive_correct,
        lapse_count = excluded.lapse_count";

fn write_item(conn: &Connection, item: &RevisionItem) -> SqlResult<()> {
    conn.execute(
        UPSERT_ITEM,
        params![
            item.item_id,
            item.memorized,
            item.memorized_at.map(|t| t.to_rfc3339()),
            item.last_reviewed_at.map(|t| t.to_rfc3339()),
            item.next_due_at.map(|t| t.to_rfc3339()),
            item.interval_days,
            item.ease_factor,
            item.learning_step,
            item.consecutive_correct,
            item.lapse_count,
        ],
    )?;
    Ok(())
}

impl RevisionStore for SqliteStore {
    fn get(&self, item_id: ItemId) -> StoreResult<Option<RevisionItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM revision_items WHERE item_id = ?1")?;
        let item = stmt
            .query_row(params![item_id], parse_item_row)
            .optional()
            .map_err(decode_error)?;
        Ok(item)
    }

    fn get_all(&self) -> StoreResult<Vec<RevisionItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM revision_items ORDER BY item_id")?;
        let items = stmt
            .query_map([], parse_item_row)?
            .collect::<SqlResult<Vec<_>>>()
            .map_err(decode_error)?;
        Ok(items)
    }

    fn upsert(&mut self, item: &RevisionItem) -> StoreResult<()> {
        write_item(&self.conn, item)?;
        Ok(())
    }

    fn record_review(&mut self, item: &RevisionItem, event: &ReviewEvent) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        write_item(&tx, item)?;
        tx.execute(
            "INSERT INTO review_events (id, item_id, occurred_at, outcome) VALUES (?1, ?2, ?3, ?4)",
            params![
                event.id.to_string(),
                event.item_id,
                event.occurred_at.to_rfc3339(),
                event.outcome.as_str(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn events_for(&self, item_id: ItemId) -> StoreResult<Vec<ReviewEvent>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM review_events WHERE item_id = ?1")?;
        let events = stmt
            .query_map(params![item_id], parse_event_row)?
            .collect::<SqlResult<Vec<_>>>()
            .map_err(decode_error)?;
        Ok(events)
    }

    fn all_events(&self) -> StoreResult<Vec<ReviewEvent>> {
        let mut stmt = self.conn.prepare("SELECT * FROM review_events")?;
        let events = stmt
            .query_map([], parse_event_row)?
            .collect::<SqlResult<Vec<_>>>()
            .map_err(decode_error)?;
        Ok(events)
    }
}

/// Rows that fail to decode are reported as `Corrupt`.
fn decode_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(_, _, source) => StoreError::Corrupt(source.to_string()),
        other => StoreError::Sqlite(other),
    }
}

fn conversion_error(column: &str, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, format!("{column}: {message}").into())
}

fn parse_timestamp(column: &str, value: &str) -> SqlResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e.to_string()))
}

fn optional_timestamp(row: &rusqlite::Row, column: &str) -> SqlResult<Option<DateTime<Utc>>> {
    let value: Option<String> = row.get(column)?;
    value.map(|v| parse_timestamp(column, &v)).transpose()
}

fn parse_item_row(row: &rusqlite::Row) -> SqlResult<RevisionItem> {
    Ok(RevisionItem {
        item_id: row.get("item_id")?,
        memorized: row.get("memorized")?,
        memorized_at: optional_timestamp(row, "memorized_at")?,
        last_reviewed_at: optional_timestamp(row, "last_reviewed_at")?,
        next_due_at: optional_timestamp(row, "next_due_at")?,
        interval_days: row.get("interval_days")?,
        ease_factor: row.get("ease_factor")?,
        learning_step: row.get("learning_step")?,
        consecutive_correct: row.get("consecutive_correct")?,
        lapse_count: row.get("lapse_count")?,
    })
}

fn parse_event_row(row: &rusqlite::Row) -> SqlResult<ReviewEvent> {
    let id_str: String = row.get("id")?;
    let occurred_str: String = row.get("occurred_at")?;
    let outcome_str: String = row.get("outcome")?;

    let outcome = match outcome_str.as_str() {
        "easy" => Outcome::Easy,
        "medium" => Outcome::Medium,
        "hard" => Outcome::Hard,
        other => return Err(conversion_error("outcome", format!("unknown outcome {other:?}"))),
    };

    Ok(ReviewEvent {
        id: Uuid::parse_str(&id_str).map_err(|e| conversion_error("id", e.to_string()))?,
        item_id: row.get("item_id")?,
        occurred_at: parse_timestamp("occurred_at", &occurred_str)?,
        outcome,
    })
}
