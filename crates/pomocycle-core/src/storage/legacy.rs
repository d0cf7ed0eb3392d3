//! Import of the older comma-separated session log.
//!
//! The file has a `date,start_time,duration_minutes` header followed by one
//! row per session (`2026-10-16,09:41,25`). Values never contain commas or
//! quotes, so rows are split directly.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

use super::session::{SessionRecord, SessionStore};
use crate::error::PersistenceError;

const HEADER: [&str; 3] = ["date", "start_time", "duration_minutes"];

/// Append the rows of a legacy file to `store`, in file order.
///
/// A missing file imports nothing. Parsing finishes before the first append,
/// so a malformed file leaves the store untouched. Rows matching a record
/// already in the store are skipped, so importing the same file twice is
/// harmless.
///
/// Returns the number of records appended.
pub fn import_legacy_csv(path: &Path, store: &dyn SessionStore) -> Result<usize, PersistenceError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(PersistenceError::ReadFailed(format!("{}: {e}", path.display()))),
    };

    let records = parse_rows(&content)?;
    let existing: HashSet<SessionRecord> = store.list_all()?.into_iter().collect();
    let total = records.len();
    let fresh: Vec<SessionRecord> = records
        .into_iter()
        .filter(|record| !existing.contains(record))
        .collect();
    for record in &fresh {
        store.append(record)?;
    }
    tracing::info!(
        path = %path.display(),
        count = fresh.len(),
        skipped = total - fresh.len(),
        "imported legacy sessions"
    );
    Ok(fresh.len())
}

fn parse_rows(content: &str) -> Result<Vec<SessionRecord>, PersistenceError> {
    let mut records = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        if line == 1 && fields == HEADER {
            continue;
        }
        match fields.as_slice() {
            [date, start_time, minutes] => {
                records.push(SessionRecord::parse(line, date, start_time, minutes)?);
            }
            _ => {
                return Err(PersistenceError::Malformed {
                    line,
                    message: format!("expected 3 fields, found {}", fields.len()),
                })
            }
        }
    }
    Ok(records)
}
