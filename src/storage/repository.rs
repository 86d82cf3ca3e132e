use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::entry::{MoodEntry, NewMoodEntry};

/// Storage seam for mood history.
///
/// The scoring core never talks to this; callers load a snapshot, hand it to
/// the evaluators, and append whatever they decide to keep. Any store that can
/// append and list per user can sit behind it.
pub trait MoodRepository {
    /// Store a new entry and return it with its assigned id.
    fn append(&mut self, entry: NewMoodEntry) -> Result<MoodEntry>;

    /// A user's entries, oldest first. `limit` keeps only the most recent N.
    fn history(&self, user: &str, limit: Option<usize>) -> Result<Vec<MoodEntry>>;

    /// Every user with at least one entry, sorted.
    fn users(&self) -> Result<Vec<String>>;

    /// Remember that the user dismissed the supportive prompt.
    fn record_dismissal(&mut self, user: &str, at: DateTime<Utc>) -> Result<()>;

    fn last_dismissal(&self, user: &str) -> Result<Option<DateTime<Utc>>>;
}

/// Process-local repository. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    entries: Vec<MoodEntry>,
    dismissals: HashMap<String, DateTime<Utc>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MoodRepository for MemoryRepository {
    fn append(&mut self, entry: NewMoodEntry) -> Result<MoodEntry> {
        let id = self.entries.len() as i64 + 1;
        let entry = entry.into_entry(id);
        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn history(&self, user: &str, limit: Option<usize>) -> Result<Vec<MoodEntry>> {
        let mut entries: Vec<MoodEntry> = self
            .entries
            .iter()
            .filter(|e| e.user == user)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.timestamp, e.id));

        if let Some(n) = limit {
            let start = entries.len().saturating_sub(n);
            entries.drain(..start);
        }
        Ok(entries)
    }

    fn users(&self) -> Result<Vec<String>> {
        let mut users: Vec<String> = self.entries.iter().map(|e| e.user.clone()).collect();
        users.sort();
        users.dedup();
        Ok(users)
    }

    fn record_dismissal(&mut self, user: &str, at: DateTime<Utc>) -> Result<()> {
        self.dismissals.insert(user.to_string(), at);
        Ok(())
    }

    fn last_dismissal(&self, user: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.dismissals.get(user).copied())
    }
}
