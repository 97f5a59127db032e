//! Mood log kept in a local SQLite file.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

use super::models::{MoodEvent, NewMoodEvent};
use super::schema::MOOD_LOG_VERSIONED_SCHEMAS;
use super::trait_def::{MoodLogError, MoodLogStore};

pub struct SqliteMoodLogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMoodLogStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open(path).context("Failed to open mood log database")?;

        let db_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        Self::apply_schemas(&conn, db_version as usize)
            .with_context(|| format!("Failed to prepare mood log database at {:?}", path))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn apply_schemas(conn: &Connection, from_version: usize) -> Result<()> {
        let latest = MOOD_LOG_VERSIONED_SCHEMAS
            .last()
            .map(|s| s.version)
            .unwrap_or(0);
        if from_version > latest {
            bail!(
                "Mood log database version {} is newer than supported version {}",
                from_version,
                latest
            );
        }

        for schema in MOOD_LOG_VERSIONED_SCHEMAS
            .iter()
            .filter(|s| s.version > from_version)
        {
            info!("Applying mood log schema version {}", schema.version);
            conn.execute_batch(schema.up)?;
            conn.execute(&format!("PRAGMA user_version = {}", schema.version), [])?;
        }
        Ok(())
    }

    fn insert_blocking(conn: &Connection, event: &NewMoodEvent) -> Result<MoodEvent, MoodLogError> {
        conn.execute(
            "INSERT INTO mood_events (mood, age_group, note, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                event.mood.as_str(),
                event.age_group.map(|b| b.as_str()),
                event.note,
                event.created_at,
            ],
        )?;

        Ok(MoodEvent {
            id: conn.last_insert_rowid().to_string(),
            mood: event.mood.as_str().to_string(),
            age_group: event.age_group.map(|b| b.as_str().to_string()),
            note: event.note.clone(),
            created_at: event.created_at,
        })
    }

    fn select_recent_blocking(
        conn: &Connection,
        limit: usize,
    ) -> Result<Vec<MoodEvent>, MoodLogError> {
        let mut stmt = conn.prepare(
            "SELECT id, mood, age_group, note, created_at FROM mood_events
             ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(MoodEvent {
                id: row.get::<_, i64>(0)?.to_string(),
                mood: row.get(1)?,
                age_group: row.get(2)?,
                note: row.get(3)?,
                created_at: row.get::<_, DateTime<Utc>>(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, MoodLogError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, MoodLogError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| MoodLogError::Database("connection lock poisoned".to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|err| MoodLogError::Database(err.to_string()))?
    }
}

#[async_trait]
impl MoodLogStore for SqliteMoodLogStore {
    async fn record(&self, event: NewMoodEvent) -> Result<MoodEvent, MoodLogError> {
        self.with_conn(move |conn| Self::insert_blocking(conn, &event))
            .await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<MoodEvent>, MoodLogError> {
        self.with_conn(move |conn| Self::select_recent_blocking(conn, limit))
            .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
