//! Phase scheduler implementation.
//!
//! The scheduler is a tick-driven state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` once per second
//! (see [`FocusService`](crate::FocusService) for the threaded host).
//!
//! ## Phase Cycle
//!
//! ```text
//! Work -> ShortBreak -> Work -> ... -> Work -> LongBreak -> Work
//! ```
//!
//! A LongBreak follows every `work_phases_per_long_break`-th completed Work
//! phase. Expiry auto-chains into the next phase; only `pause()` stops it.
//!
//! ## Usage
//!
//! ```ignore
//! let mut scheduler = PhaseScheduler::new(Durations::default(), clock)?;
//! scheduler.start();
//! // Once per second:
//! if let Some(transition) = scheduler.tick() { /* persist, notify */ }
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::phase::{Durations, Phase};
use crate::error::ValidationError;
use crate::events::Event;
use crate::storage::SessionRecord;

/// Live countdown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerState {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub completed_work_phases: u64,
    pub running: bool,
}

/// Display snapshot of the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    pub phase: Phase,
    pub remaining_seconds: u64,
    /// Length of the current phase in seconds.
    pub phase_seconds: u64,
    pub completed_work_phases: u64,
    pub running: bool,
    pub at: NaiveDateTime,
}

/// Result of a tick that ran a phase to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub completed_work_phases: u64,
    /// Present only when `from` was Work.
    pub session: Option<SessionRecord>,
    pub at: NaiveDateTime,
}

pub struct PhaseScheduler {
    durations: Durations,
    state: SchedulerState,
    /// Length the current phase was started with. Bounds `remaining_seconds`
    /// even after `update_durations` changes the configured value.
    phase_seconds: u64,
    /// Set the first time the current phase starts counting.
    phase_started_at: Option<NaiveDateTime>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for PhaseScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseScheduler")
            .field("durations", &self.durations)
            .field("state", &self.state)
            .field("phase_seconds", &self.phase_seconds)
            .field("phase_started_at", &self.phase_started_at)
            .finish_non_exhaustive()
    }
}

impl PhaseScheduler {
    /// Create a scheduler in the initial state: Work, full duration, paused.
    pub fn new(durations: Durations, clock: Arc<dyn Clock>) -> Result<Self, ValidationError> {
        durations.validate()?;
        let phase_seconds = durations.seconds_for(Phase::Work);
        Ok(Self {
            durations,
            state: SchedulerState {
                phase: Phase::Work,
                remaining_seconds: phase_seconds,
                completed_work_phases: 0,
                running: false,
            },
            phase_seconds,
            phase_started_at: None,
            clock,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn current_phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.state.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn completed_work_count(&self) -> u64 {
        self.state.completed_work_phases
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn phase_seconds(&self) -> u64 {
        self.phase_seconds
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            phase: self.state.phase,
            remaining_seconds: self.state.remaining_seconds,
            phase_seconds: self.phase_seconds,
            completed_work_phases: self.state.completed_work_phases,
            running: self.state.running,
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.running {
            return None;
        }
        let now = self.clock.now();
        self.state.running = true;
        self.phase_started_at.get_or_insert(now);
        Some(Event::TimerStarted {
            phase: self.state.phase,
            remaining_seconds: self.state.remaining_seconds,
            at: now,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.state.running = false;
        Some(Event::TimerPaused {
            phase: self.state.phase,
            remaining_seconds: self.state.remaining_seconds,
            at: self.clock.now(),
        })
    }

    /// Stop and return to the initial state for the configured durations.
    /// An unfinished Work phase is discarded, never recorded.
    pub fn reset(&mut self) -> Option<Event> {
        self.state.running = false;
        self.state.phase = Phase::Work;
        self.state.completed_work_phases = 0;
        self.phase_seconds = self.durations.seconds_for(Phase::Work);
        self.state.remaining_seconds = self.phase_seconds;
        self.phase_started_at = None;
        Some(Event::TimerReset {
            at: self.clock.now(),
        })
    }

    /// Replace the durations used for future phases. While paused the
    /// current phase is re-sized too, so the displayed countdown matches
    /// what will run.
    pub fn update_durations(&mut self, durations: Durations) -> Result<Event, ValidationError> {
        durations.validate()?;
        self.durations = durations;
        if !self.state.running {
            self.phase_seconds = durations.seconds_for(self.state.phase);
            self.state.remaining_seconds = self.phase_seconds;
        }
        Ok(Event::DurationsUpdated {
            durations,
            at: self.clock.now(),
        })
    }

    /// Advance the countdown by one second. Returns the transition when the
    /// current phase runs out.
    pub fn tick(&mut self) -> Option<PhaseTransition> {
        if !self.state.running {
            return None;
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds > 0 {
            return None;
        }

        let now = self.clock.now();
        let from = self.state.phase;
        let session = (from == Phase::Work).then(|| {
            let started = self.phase_started_at.unwrap_or(now);
            SessionRecord::new(
                now.date(),
                started.time(),
                u32::try_from(self.phase_seconds / 60).unwrap_or(u32::MAX),
            )
        });

        self.advance(now);

        Some(PhaseTransition {
            from,
            to: self.state.phase,
            completed_work_phases: self.state.completed_work_phases,
            session,
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn advance(&mut self, now: NaiveDateTime) {
        let next = match self.state.phase {
            Phase::Work => {
                self.state.completed_work_phases += 1;
                let every = u64::from(self.durations.work_phases_per_long_break);
                if self.state.completed_work_phases % every == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        };
        self.state.phase = next;
        self.phase_seconds = self.durations.seconds_for(next);
        self.state.remaining_seconds = self.phase_seconds;
        self.phase_started_at = Some(now);
    }
}
