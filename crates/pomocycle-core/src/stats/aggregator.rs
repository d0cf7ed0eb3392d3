//! Daily and weekly focus totals.
//!
//! Everything here is recomputed from the store on each call; nothing is
//! cached between queries.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, ValidationError};
use crate::storage::{SessionRecord, SessionStore};

/// Focus minutes recorded on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_minutes: u64,
}

/// Trailing seven-day summary ending today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    /// Oldest first, today last.
    pub days: Vec<DailyTotal>,
    pub total_minutes: u64,
    pub total_hours: f64,
    pub average_daily: f64,
    /// Busiest day; the earliest wins a tie. `None` for an empty week.
    pub peak: Option<DailyTotal>,
}

/// Read-side view over a [`SessionStore`].
pub struct StatsAggregator<'a> {
    store: &'a dyn SessionStore,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(store: &'a dyn SessionStore) -> Self {
        Self { store }
    }

    pub fn total_minutes(&self, date: NaiveDate) -> Result<u64, PersistenceError> {
        Ok(total_minutes_in(&self.store.list_all()?, date))
    }

    pub fn daily_totals(&self, range: &[NaiveDate]) -> Result<Vec<DailyTotal>, PersistenceError> {
        Ok(daily_totals_in(&self.store.list_all()?, range))
    }

    /// Mean minutes per day over `range`.
    ///
    /// # Errors
    /// `ValidationError::EmptyRange` for an empty range, or the store's
    /// read error.
    pub fn average_daily(&self, range: &[NaiveDate]) -> crate::Result<f64> {
        if range.is_empty() {
            return Err(ValidationError::EmptyRange.into());
        }
        Ok(average_of(&self.daily_totals(range)?)?)
    }

    pub fn weekly_report(&self, today: NaiveDate) -> Result<WeeklyReport, PersistenceError> {
        let days = daily_totals_in(&self.store.list_all()?, &trailing_week(today));
        let total_minutes = days.iter().map(|d| d.total_minutes).sum::<u64>();
        let peak = days
            .iter()
            .copied()
            .fold(None::<DailyTotal>, |best, day| match best {
                Some(b) if b.total_minutes >= day.total_minutes => Some(b),
                _ if day.total_minutes > 0 => Some(day),
                _ => best,
            });
        Ok(WeeklyReport {
            total_hours: total_minutes as f64 / 60.0,
            average_daily: total_minutes as f64 / days.len() as f64,
            total_minutes,
            peak,
            days,
        })
    }
}

/// `[today - 6 ..= today]`, oldest first.
pub fn trailing_week(today: NaiveDate) -> Vec<NaiveDate> {
    (0..7).rev().map(|back| today - Duration::days(back)).collect()
}

pub fn total_minutes_in(records: &[SessionRecord], date: NaiveDate) -> u64 {
    records
        .iter()
        .filter(|r| r.date == date)
        .map(|r| u64::from(r.duration_minutes))
        .sum()
}

pub fn daily_totals_in(records: &[SessionRecord], range: &[NaiveDate]) -> Vec<DailyTotal> {
    range
        .iter()
        .map(|&date| DailyTotal {
            date,
            total_minutes: total_minutes_in(records, date),
        })
        .collect()
}

pub fn average_of(totals: &[DailyTotal]) -> Result<f64, ValidationError> {
    if totals.is_empty() {
        return Err(ValidationError::EmptyRange);
    }
    let sum: u64 = totals.iter().map(|d| d.total_minutes).sum();
    Ok(sum as f64 / totals.len() as f64)
}
