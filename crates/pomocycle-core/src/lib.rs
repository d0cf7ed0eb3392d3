//! # Pomocycle Core Library
//!
//! This library provides the session scheduler behind the Pomocycle focus
//! timer: a countdown that cycles through work and break phases, records
//! every completed work phase, and reports daily and weekly focus totals.
//! The `pomocycle` CLI is a thin host over the same core.
//!
//! ## Architecture
//!
//! - **Phase Scheduler**: a tick-driven state machine; the caller invokes
//!   `tick()` once per second
//! - **Focus Service**: runs the ticker in the background under one lock and
//!   persists sessions and sends alerts outside it
//! - **Storage**: SQLite session store and TOML configuration
//! - **Stats**: on-demand daily totals, trailing week, average and peak day
//!
//! ## Key Components
//!
//! - [`PhaseScheduler`]: core countdown state machine
//! - [`FocusService`]: concurrent host with an event stream
//! - [`Database`]: durable [`SessionStore`]
//! - [`StatsAggregator`]: read-side statistics
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod service;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, PersistenceError, Result, ValidationError};
pub use events::Event;
pub use notify::{LogNotifier, NoopNotifier, NotificationSink};
pub use service::FocusService;
pub use stats::{DailyTotal, StatsAggregator, WeeklyReport};
pub use storage::{Config, Database, MemorySessionStore, SessionRecord, SessionStore};
pub use timer::{
    Clock, Durations, ManualClock, Phase, PhaseScheduler, PhaseTransition, SchedulerSnapshot,
    SchedulerState, SystemClock,
};
