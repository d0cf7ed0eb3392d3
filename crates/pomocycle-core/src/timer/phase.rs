use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_break(self) -> bool {
        !matches!(self, Phase::Work)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Work => "Work",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        })
    }
}

/// Configured phase lengths and the cycle length.
///
/// All four values must be positive; use [`Durations::new`] or call
/// [`Durations::validate`] on values that came from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub work_phases_per_long_break: u32,
}

impl Durations {
    pub fn new(
        work_minutes: u32,
        short_break_minutes: u32,
        long_break_minutes: u32,
        work_phases_per_long_break: u32,
    ) -> Result<Self, ValidationError> {
        let durations = Self {
            work_minutes,
            short_break_minutes,
            long_break_minutes,
            work_phases_per_long_break,
        };
        durations.validate()?;
        Ok(durations)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("work_minutes", self.work_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("long_break_minutes", self.long_break_minutes),
            ("work_phases_per_long_break", self.work_phases_per_long_break),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some(&(field, _)) => Err(ValidationError::NonPositive { field }),
            None => Ok(()),
        }
    }

    pub fn minutes_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes,
            Phase::ShortBreak => self.short_break_minutes,
            Phase::LongBreak => self.long_break_minutes,
        }
    }

    /// Phase length in seconds.
    pub fn seconds_for(&self, phase: Phase) -> u64 {
        u64::from(self.minutes_for(phase)) * 60
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            work_phases_per_long_break: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_classic_pomodoro() {
        let d = Durations::default();
        assert_eq!(d.seconds_for(Phase::Work), 1500);
        assert_eq!(d.seconds_for(Phase::ShortBreak), 300);
        assert_eq!(d.seconds_for(Phase::LongBreak), 900);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn zero_values_are_rejected() {
        assert_eq!(
            Durations::new(0, 5, 15, 4),
            Err(ValidationError::NonPositive {
                field: "work_minutes"
            })
        );
        assert_eq!(
            Durations::new(25, 5, 15, 0),
            Err(ValidationError::NonPositive {
                field: "work_phases_per_long_break"
            })
        );
    }

    #[test]
    fn phase_labels() {
        assert_eq!(Phase::ShortBreak.to_string(), "Short Break");
        assert!(Phase::LongBreak.is_break());
        assert!(!Phase::Work.is_break());
        assert_eq!(
            serde_json::to_string(&Phase::LongBreak).unwrap(),
            "\"long_break\""
        );
    }
}
