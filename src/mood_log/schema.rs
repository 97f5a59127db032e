//! Schema definition for the local mood log database.

pub struct MoodLogSchema {
    pub version: usize,
    pub up: &'static str,
}

pub const MOOD_LOG_VERSIONED_SCHEMAS: &[MoodLogSchema] = &[MoodLogSchema {
    version: 1,
    up: r#"
            CREATE TABLE IF NOT EXISTS mood_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mood TEXT NOT NULL,
                age_group TEXT,
                note TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_mood_events_created_at ON mood_events(created_at);
        "#,
}];
