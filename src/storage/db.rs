use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};

use super::entry::{MoodEntry, NewMoodEntry, RawFeatures, Source};
use super::repository::MoodRepository;
use crate::scoring::MoodScore;

/// SQLite-backed mood history.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open (or create) the database at the configured data path.
    pub fn open_default() -> Result<Self> {
        Self::open(&crate::paths::db_path())
    }

    /// Open (or create) a database file, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;

        init_schema(&conn)?;
        tracing::debug!(path = %path.display(), "opened mood database");
        Ok(Self { conn })
    }

    /// A throwaway database that lives in memory.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Create tables if they don't exist. Idempotent.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS mood_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            mood_score INTEGER NOT NULL CHECK (mood_score BETWEEN 1 AND 10),
            source TEXT NOT NULL,
            raw_features TEXT,
            note TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_mood_entries_user_time
            ON mood_entries(user, timestamp);

        CREATE TABLE IF NOT EXISTS dismissals (
            user TEXT PRIMARY KEY,
            dismissed_at TEXT NOT NULL
        );",
    )
    .context("Failed to initialize database schema")?;

    Ok(())
}

/// Fixed-width UTC timestamps so text order matches time order.
fn stamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Column values as stored, before parsing back into domain types.
struct EntryRow {
    id: i64,
    user: String,
    timestamp: String,
    mood_score: i64,
    source: String,
    raw_features: Option<String>,
    note: Option<String>,
}

impl EntryRow {
    fn into_entry(self) -> Result<MoodEntry> {
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .with_context(|| format!("Bad timestamp on entry {}: {}", self.id, self.timestamp))?
            .with_timezone(&Utc);

        let raw_features = match self.raw_features {
            Some(json) => Some(
                serde_json::from_str::<RawFeatures>(&json)
                    .with_context(|| format!("Failed to parse raw features of entry {}", self.id))?,
            ),
            None => None,
        };

        Ok(MoodEntry {
            id: self.id,
            user: self.user,
            timestamp,
            mood_score: MoodScore::new(self.mood_score),
            source: self.source.parse::<Source>()?,
            raw_features,
            note: self.note,
        })
    }
}

impl MoodRepository for SqliteRepository {
    fn append(&mut self, entry: NewMoodEntry) -> Result<MoodEntry> {
        let raw_json = entry
            .raw_features
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize raw features")?;

        self.conn
            .execute(
                "INSERT INTO mood_entries (user, timestamp, mood_score, source, raw_features, note)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    entry.user,
                    stamp(&entry.timestamp),
                    entry.mood_score.get(),
                    entry.source.as_str(),
                    raw_json,
                    entry.note,
                ],
            )
            .context("Failed to insert mood entry")?;

        let id = self.conn.last_insert_rowid();
        tracing::info!(id, user = %entry.user, score = entry.mood_score.get(), source = %entry.source, "stored mood entry");
        Ok(entry.into_entry(id))
    }

    fn history(&self, user: &str, limit: Option<usize>) -> Result<Vec<MoodEntry>> {
        // Pull the newest N, then flip to oldest-first.
        let limit = limit.map_or(-1, |n| n as i64);
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user, timestamp, mood_score, source, raw_features, note
                 FROM mood_entries
                 WHERE user = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )
            .context("Failed to prepare history query")?;

        let rows = stmt
            .query_map(rusqlite::params![user, limit], |row| {
                Ok(EntryRow {
                    id: row.get(0)?,
                    user: row.get(1)?,
                    timestamp: row.get(2)?,
                    mood_score: row.get(3)?,
                    source: row.get(4)?,
                    raw_features: row.get(5)?,
                    note: row.get(6)?,
                })
            })
            .with_context(|| format!("Failed to load history for {user}"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read history rows")?;

        let mut entries = rows
            .into_iter()
            .map(EntryRow::into_entry)
            .collect::<Result<Vec<_>>>()?;
        entries.reverse();
        Ok(entries)
    }

    fn users(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT user FROM mood_entries ORDER BY user")
            .context("Failed to prepare users query")?;

        let users = stmt
            .query_map([], |row| row.get(0))
            .context("Failed to list users")?
            .collect::<rusqlite::Result<Vec<String>>>()
            .context("Failed to read user rows")?;

        Ok(users)
    }

    fn record_dismissal(&mut self, user: &str, at: DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO dismissals (user, dismissed_at) VALUES (?1, ?2)
                 ON CONFLICT(user) DO UPDATE SET dismissed_at = ?2",
                rusqlite::params![user, stamp(&at)],
            )
            .with_context(|| format!("Failed to record dismissal for {user}"))?;
        Ok(())
    }

    fn last_dismissal(&self, user: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT dismissed_at FROM dismissals WHERE user = ?1",
                [user],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to load dismissal for {user}"))?;

        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .with_context(|| format!("Bad dismissal timestamp for {user}: {s}"))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::aggregate::DiscrepancyLevel;
    use crate::scoring::voice::{Clarity, VoiceFeatures};
    use chrono::{Duration, TimeZone};

    fn test_db() -> SqliteRepository {
        SqliteRepository::open_in_memory().unwrap()
    }

    fn new_entry(user: &str, day: i64, score: i64) -> NewMoodEntry {
        NewMoodEntry {
            user: user.into(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 15, 20, 0, 0).unwrap() + Duration::days(day),
            mood_score: MoodScore::new(score),
            source: Source::Text,
            raw_features: Some(RawFeatures::Text {
                positive_words: vec!["calm".into()],
                negative_words: vec![],
                negations: 0,
                exclamations: 1,
            }),
            note: Some("felt calm today!".into()),
        }
    }

    #[test]
    fn schema_creation_idempotent() {
        let db = test_db();
        // Call init_schema again; should not error
        init_schema(&db.conn).unwrap();
        init_schema(&db.conn).unwrap();
    }

    #[test]
    fn roundtrip_append_load() {
        let mut db = test_db();
        let stored = db.append(new_entry("me", 0, 7)).unwrap();

        let loaded = db.history("me", None).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], stored);
        assert_eq!(loaded[0].note.as_deref(), Some("felt calm today!"));
    }

    #[test]
    fn combined_features_roundtrip() {
        let mut db = test_db();
        let mut entry = new_entry("me", 0, 5);
        entry.source = Source::Combined;
        entry.raw_features = Some(RawFeatures::Combined {
            text_score: 7.0,
            voice_score: 4.5,
            final_score: 5.5,
            discrepancy: DiscrepancyLevel::High,
            features: VoiceFeatures {
                energy: 0.045,
                rms: 0.3,
                zero_crossing_rate: 120.0,
                spectral_centroid: 1800.0,
            },
            clarity: Clarity::Moderate,
            voice_confidence: 1.0,
        });
        let stored = db.append(entry).unwrap();
        assert_eq!(db.history("me", None).unwrap()[0], stored);
    }

    #[test]
    fn history_is_oldest_first() {
        let mut db = test_db();
        // Insert out of order
        db.append(new_entry("me", 3, 4)).unwrap();
        db.append(new_entry("me", 1, 8)).unwrap();
        db.append(new_entry("me", 2, 6)).unwrap();

        let scores: Vec<u8> = db
            .history("me", None)
            .unwrap()
            .iter()
            .map(|e| e.mood_score.get())
            .collect();
        assert_eq!(scores, vec![8, 6, 4]);
    }

    #[test]
    fn limit_keeps_most_recent() {
        let mut db = test_db();
        for day in 0..10 {
            db.append(new_entry("me", day, day + 1)).unwrap();
        }
        let scores: Vec<u8> = db
            .history("me", Some(3))
            .unwrap()
            .iter()
            .map(|e| e.mood_score.get())
            .collect();
        assert_eq!(scores, vec![8, 9, 10]);
    }

    #[test]
    fn history_is_scoped_by_user() {
        let mut db = test_db();
        db.append(new_entry("alice", 0, 3)).unwrap();
        db.append(new_entry("bob", 0, 9)).unwrap();

        assert_eq!(db.history("alice", None).unwrap().len(), 1);
        assert_eq!(db.users().unwrap(), vec!["alice", "bob"]);
        assert!(db.history("carol", None).unwrap().is_empty());
    }

    #[test]
    fn score_column_rejects_out_of_range() {
        let db = test_db();
        let result = db.conn.execute(
            "INSERT INTO mood_entries (user, timestamp, mood_score, source) VALUES ('x', 't', 11, 'text')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn dismissal_upsert() {
        let mut db = test_db();
        assert!(db.last_dismissal("me").unwrap().is_none());

        let first = Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap();
        let second = first + Duration::hours(30);
        db.record_dismissal("me", first).unwrap();
        db.record_dismissal("me", second).unwrap();
        assert_eq!(db.last_dismissal("me").unwrap(), Some(second));
    }

    #[test]
    fn file_database_persists() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("moodlog.db");
        {
            let mut db = SqliteRepository::open(&path).unwrap();
            db.append(new_entry("me", 0, 6)).unwrap();
        }
        let db = SqliteRepository::open(&path).unwrap();
        assert_eq!(db.history("me", None).unwrap().len(), 1);
    }
}
