//! SQLite backend
//!
//! A single connection guarded by a mutex; every query runs on tokio's
//! blocking pool so async callers are never stalled by disk I/O.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{LatestAvailabilityStore, StorageError, StorageResult, TourRepository};
use crate::models::{StoredAvailability, Tour};

/// Path value that opens an in-memory database
pub const IN_MEMORY: &str = ":memory:";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS tours (
        uuid TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        url TEXT NOT NULL,
        api_url TEXT
    );

    CREATE TABLE IF NOT EXISTS latest_availability (
        tour_uuid TEXT PRIMARY KEY,
        availability_date TEXT NOT NULL,
        availability_epoch_ms INTEGER NOT NULL,
        recorded_at TEXT NOT NULL,
        raw_data TEXT
    );
"#;

/// SQLite implementation of both storage traits
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file; `:memory:` opens an in-memory database
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if path.as_os_str() == IN_MEMORY {
            return Self::in_memory();
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        let store = Self::from_connection(conn)?;

        tracing::info!(path = %path.display(), "SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory database
    pub fn in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

fn parse_uuid(column: &'static str, value: &str) -> StorageResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| StorageError::invalid(column, e))
}

fn tour_from_row(row: (String, String, String, Option<String>)) -> StorageResult<Tour> {
    let (uuid, name, url, api_url) = row;
    Ok(Tour {
        id: parse_uuid("uuid", &uuid)?,
        name,
        url,
        api_url,
    })
}

#[async_trait]
impl LatestAvailabilityStore for SqliteStore {
    async fn get_latest(&self, tour_id: Uuid) -> StorageResult<Option<StoredAvailability>> {
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT availability_date, recorded_at, raw_data
                     FROM latest_availability WHERE tour_uuid = ?1",
                    params![tour_id.to_string()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                        ))
                    },
                )
                .optional()?;

            let Some((availability_date, recorded_at, raw_data)) = row else {
                return Ok(None);
            };

            Ok(Some(StoredAvailability {
                tour_id,
                availability_date: DateTime::parse_from_rfc3339(&availability_date)
                    .map_err(|e| StorageError::invalid("availability_date", e))?,
                recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| StorageError::invalid("recorded_at", e))?,
                raw_data,
            }))
        })
        .await
    }

    async fn put_latest(&self, record: &StoredAvailability) -> StorageResult<bool> {
        let record = record.clone();
        self.with_conn(move |conn| {
            // RFC 3339 text with offsets does not sort by instant; compare epoch millis
            let changed = conn.execute(
                r#"
                    INSERT INTO latest_availability
                        (tour_uuid, availability_date, availability_epoch_ms, recorded_at, raw_data)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(tour_uuid) DO UPDATE SET
                        availability_date = excluded.availability_date,
                        availability_epoch_ms = excluded.availability_epoch_ms,
                        recorded_at = excluded.recorded_at,
                        raw_data = excluded.raw_data
                    WHERE excluded.availability_epoch_ms > latest_availability.availability_epoch_ms
                    "#,
                params![
                    record.tour_id.to_string(),
                    record.availability_date.to_rfc3339(),
                    record.availability_date.timestamp_millis(),
                    record.recorded_at.to_rfc3339(),
                    record.raw_data,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }
}

#[async_trait]
impl TourRepository for SqliteStore {
    async fn list_tours(&self) -> StorageResult<Vec<Tour>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT uuid, name, url, api_url FROM tours ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter().map(tour_from_row).collect()
        })
        .await
    }

    async fn get_tour(&self, id: Uuid) -> StorageResult<Option<Tour>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT uuid, name, url, api_url FROM tours WHERE uuid = ?1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?
            .map(tour_from_row)
            .transpose()
        })
        .await
    }

    async fn upsert_tour(&self, tour: &Tour) -> StorageResult<()> {
        let tour = tour.clone();
        self.with_conn(move |conn| {
            conn.execute(
                r#"
                    INSERT INTO tours (uuid, name, url, api_url)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(uuid) DO UPDATE SET
                        name = excluded.name,
                        url = excluded.url,
                        api_url = excluded.api_url
                    "#,
                params![tour.id.to_string(), tour.name, tour.url, tour.api_url],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_tour(&self, id: Uuid) -> StorageResult<bool> {
        self.with_conn(move |conn| {
            let deleted = conn.execute("DELETE FROM tours WHERE uuid = ?1", params![id.to_string()])?;
            Ok(deleted > 0)
        })
        .await
    }
}
