//! Phase-change alerts.
//!
//! The scheduler hands a title and message to a [`NotificationSink`] when a
//! phase ends. Delivery is fire-and-forget: a sink that cannot display the
//! alert drops it, and the countdown carries on.

use crate::timer::Phase;

/// Receives phase-transition alerts.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Writes alerts to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        tracing::info!(target: "pomocycle::notify", title, "{message}");
    }
}

/// Discards every alert.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl NotificationSink for NoopNotifier {
    fn notify(&self, _title: &str, _message: &str) {}
}

/// Alert text announcing the phase that just began.
pub fn phase_message(new_phase: Phase) -> String {
    if new_phase.is_break() {
        format!("Time's up! {new_phase} time starts now.")
    } else {
        "Time's up! Focus time starts now.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_new_phase() {
        assert_eq!(phase_message(Phase::Work), "Time's up! Focus time starts now.");
        assert_eq!(
            phase_message(Phase::ShortBreak),
            "Time's up! Short Break time starts now."
        );
        assert_eq!(
            phase_message(Phase::LongBreak),
            "Time's up! Long Break time starts now."
        );
    }
}
