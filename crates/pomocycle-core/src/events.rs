use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::storage::SessionRecord;
use crate::timer::{Durations, Phase};

/// Every state change in the scheduler produces an Event.
/// Hosts subscribe to them through [`FocusService::subscribe`](crate::FocusService::subscribe).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_seconds: u64,
        at: NaiveDateTime,
    },
    TimerPaused {
        phase: Phase,
        remaining_seconds: u64,
        at: NaiveDateTime,
    },
    TimerReset {
        at: NaiveDateTime,
    },
    DurationsUpdated {
        durations: Durations,
        at: NaiveDateTime,
    },
    /// The countdown hit zero and the next phase has begun.
    PhaseChanged {
        new_phase: Phase,
        completed_work_phases: u64,
        at: NaiveDateTime,
    },
    /// A Work phase ran to zero and its record is on disk.
    SessionCompleted {
        record: SessionRecord,
    },
    /// A Work phase ran to zero but the store refused the record.
    SessionPersistFailed {
        record: SessionRecord,
        #[serde(with = "error_string")]
        error: PersistenceError,
    },
}

mod error_string {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::error::PersistenceError;

    pub fn serialize<S: Serializer>(err: &PersistenceError, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(err)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<PersistenceError, D::Error> {
        String::deserialize(d).map(PersistenceError::WriteFailed)
    }
}
