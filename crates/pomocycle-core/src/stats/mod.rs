//! Statistics over recorded focus sessions.
//!
//! Totals are derived from the session store on demand: per-date sums, the
//! trailing seven-day window and its average and peak day.

mod aggregator;

pub use aggregator::{
    average_of, daily_totals_in, total_minutes_in, trailing_week, DailyTotal, StatsAggregator,
    WeeklyReport,
};
