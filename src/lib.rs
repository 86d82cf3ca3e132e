//! Journal check-ins scored for mood from text and voice.
//!
//! `scoring` holds the pure heuristics. Everything else feeds it
//! (`audio`, `dsp`), stores its output (`storage`), or presents it
//! (`report`, `intervention`).

pub mod audio;
pub mod checkin;
pub mod config;
pub mod dsp;
pub mod error;
pub mod intervention;
pub mod logging;
pub mod paths;
pub mod report;
pub mod scoring;
pub mod storage;
pub mod util;
