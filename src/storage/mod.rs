pub mod db;
pub mod entry;
pub mod repository;

pub use db::SqliteRepository;
pub use entry::{MoodEntry, NewMoodEntry, RawFeatures, Source};
pub use repository::{MemoryRepository, MoodRepository};
