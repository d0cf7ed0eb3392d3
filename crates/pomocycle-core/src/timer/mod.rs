mod clock;
mod engine;
mod phase;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{PhaseScheduler, PhaseTransition, SchedulerSnapshot, SchedulerState};
pub use phase::{Durations, Phase};
