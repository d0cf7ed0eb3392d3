//! Session records and the store contract.

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Wire format for dates in the store and legacy files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format for start times; whole minutes only.
pub const TIME_FORMAT: &str = "%H:%M";

/// One completed Work phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionRecord {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
}

impl SessionRecord {
    /// Build a record; `start_time` is truncated to the minute to match the
    /// stored `HH:MM` format.
    pub fn new(date: NaiveDate, start_time: NaiveTime, duration_minutes: u32) -> Self {
        let start_time = NaiveTime::from_hms_opt(start_time.hour(), start_time.minute(), 0)
            .unwrap_or(start_time);
        Self {
            date,
            start_time,
            duration_minutes,
        }
    }

    /// Decode the three text columns shared by the database and legacy CSV.
    pub fn parse(
        line: usize,
        date: &str,
        start_time: &str,
        duration_minutes: &str,
    ) -> Result<Self, PersistenceError> {
        let malformed = |message: String| PersistenceError::Malformed { line, message };
        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|e| malformed(format!("date '{date}': {e}")))?;
        let start_time = parse_time(start_time.trim())
            .ok_or_else(|| malformed(format!("start_time '{start_time}'")))?;
        let duration_minutes = duration_minutes
            .trim()
            .parse::<u32>()
            .map_err(|e| malformed(format!("duration_minutes '{duration_minutes}': {e}")))?;
        Ok(Self::new(date, start_time, duration_minutes))
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Durable, append-only log of completed sessions.
pub trait SessionStore: Send + Sync {
    /// Persist one record. Must be durable when this returns `Ok`.
    fn append(&self, record: &SessionRecord) -> Result<(), PersistenceError>;

    /// Every record in append order.
    fn list_all(&self) -> Result<Vec<SessionRecord>, PersistenceError>;
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: Mutex<Vec<SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SessionRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn append(&self, record: &SessionRecord) -> Result<(), PersistenceError> {
        self.records
            .lock()
            .map_err(|e| PersistenceError::WriteFailed(e.to_string()))?
            .push(record.clone());
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
        Ok(self
            .records
            .lock()
            .map_err(|e| PersistenceError::ReadFailed(e.to_string()))?
            .clone())
    }
}
