//! Threaded host for the phase scheduler.
//!
//! [`FocusService`] owns one [`PhaseScheduler`] behind a single async mutex.
//! A background tokio task ticks it once per interval; commands from the
//! foreground take the same lock, so a tick's decrement, expiry check and
//! phase switch are never interleaved with `pause()` or `reset()`.
//!
//! Notifications run after the lock is released. Sessions completed by the
//! background ticker go to a separate writer task, so a slow disk never
//! delays the next tick or a foreground command.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::error::{PersistenceError, ValidationError};
use crate::events::Event;
use crate::notify::{phase_message, NotificationSink};
use crate::stats::StatsAggregator;
use crate::storage::{SessionRecord, SessionStore};
use crate::timer::{Clock, Durations, Phase, PhaseScheduler, PhaseTransition, SchedulerSnapshot};

const EVENT_CAPACITY: usize = 256;
const DEFAULT_TITLE: &str = "Pomocycle";

struct Ticker {
    handle: JoinHandle<()>,
    writer: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

struct Shared {
    scheduler: Mutex<PhaseScheduler>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn NotificationSink>,
    events: broadcast::Sender<Event>,
    ticker: Mutex<Option<Ticker>>,
}

impl Shared {
    fn announce(&self, title: &str, transition: &PhaseTransition) {
        tracing::info!(
            from = %transition.from,
            to = %transition.to,
            completed_work_phases = transition.completed_work_phases,
            "phase changed"
        );
        self.notifier.notify(title, &phase_message(transition.to));
        publish(
            &self.events,
            Event::PhaseChanged {
                new_phase: transition.to,
                completed_work_phases: transition.completed_work_phases,
                at: transition.at,
            },
        );
    }
}

/// Scheduler, store and notifier wired together.
///
/// Cheap to clone; clones share the same scheduler. The background ticker
/// only holds a weak reference, so dropping every clone stops it even
/// without [`FocusService::shutdown`].
#[derive(Clone)]
pub struct FocusService {
    shared: Arc<Shared>,
    tick_interval: Duration,
    title: String,
}

impl FocusService {
    pub fn new(
        durations: Durations,
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ValidationError> {
        let scheduler = PhaseScheduler::new(durations, clock)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            shared: Arc::new(Shared {
                scheduler: Mutex::new(scheduler),
                store,
                notifier,
                events,
                ticker: Mutex::new(None),
            }),
            tick_interval: Duration::from_secs(1),
            title: DEFAULT_TITLE.to_string(),
        })
    }

    /// Override the one-second tick (tests, demos).
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Title used for phase-change alerts.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    pub fn stats(&self) -> StatsAggregator<'_> {
        StatsAggregator::new(self.shared.store.as_ref())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn current_phase(&self) -> Phase {
        self.shared.scheduler.lock().await.current_phase()
    }

    pub async fn remaining_seconds(&self) -> u64 {
        self.shared.scheduler.lock().await.remaining_seconds()
    }

    pub async fn is_running(&self) -> bool {
        self.shared.scheduler.lock().await.is_running()
    }

    pub async fn completed_work_count(&self) -> u64 {
        self.shared.scheduler.lock().await.completed_work_count()
    }

    pub async fn durations(&self) -> Durations {
        self.shared.scheduler.lock().await.durations()
    }

    pub async fn snapshot(&self) -> SchedulerSnapshot {
        self.shared.scheduler.lock().await.snapshot()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub async fn start(&self) {
        let event = self.shared.scheduler.lock().await.start();
        self.publish_opt(event);
    }

    pub async fn pause(&self) {
        let event = self.shared.scheduler.lock().await.pause();
        self.publish_opt(event);
    }

    pub async fn reset(&self) {
        let event = self.shared.scheduler.lock().await.reset();
        self.publish_opt(event);
    }

    pub async fn update_durations(&self, durations: Durations) -> Result<(), ValidationError> {
        let event = self
            .shared
            .scheduler
            .lock()
            .await
            .update_durations(durations)?;
        publish(&self.shared.events, event);
        Ok(())
    }

    /// Run one scheduler tick, then notify and persist outside the lock.
    ///
    /// Unlike the background ticker, this waits for the session append, so
    /// the record is in the store when it returns.
    pub async fn tick(&self) -> Option<PhaseTransition> {
        let transition = self.shared.scheduler.lock().await.tick()?;

        self.shared.announce(&self.title, &transition);
        if let Some(record) = &transition.session {
            record_session(self.shared.store.clone(), &self.shared.events, record.clone()).await;
        }

        Some(transition)
    }

    // ── Ticker lifecycle ─────────────────────────────────────────────

    /// Start the background ticker and its session writer. No-op if they
    /// are already running.
    pub async fn spawn(&self) {
        let mut ticker = self.shared.ticker.lock().await;
        if ticker.is_some() {
            return;
        }

        let (records, mut pending) = mpsc::unbounded_channel::<SessionRecord>();
        let store = self.shared.store.clone();
        let events = self.shared.events.clone();
        let writer = tokio::spawn(async move {
            while let Some(record) = pending.recv().await {
                record_session(store.clone(), &events, record).await;
            }
            tracing::debug!("session writer stopped");
        });

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let shared = Arc::downgrade(&self.shared);
        let title = self.title.clone();
        let period = self.tick_interval;
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    biased;
                    // Also fires when the service is dropped with the sender.
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => {
                        if !tick_in_background(&shared, &title, &records).await {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("ticker stopped");
        });

        tracing::debug!(interval_ms = period.as_millis() as u64, "ticker spawned");
        *ticker = Some(Ticker {
            handle,
            writer,
            shutdown,
        });
    }

    /// Stop the ticker, then wait for the writer to drain. Every session the
    /// ticker completed is appended before this returns.
    pub async fn shutdown(&self) {
        let Some(ticker) = self.shared.ticker.lock().await.take() else {
            return;
        };
        let _ = ticker.shutdown.send(true);
        if let Err(e) = ticker.handle.await {
            tracing::error!(error = %e, "ticker task failed");
        }
        // The ticker owned the only sender; the writer stops once the queue is empty.
        if let Err(e) = ticker.writer.await {
            tracing::error!(error = %e, "session writer failed");
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn publish_opt(&self, event: Option<Event>) {
        if let Some(event) = event {
            tracing::debug!(?event, "scheduler command");
            publish(&self.shared.events, event);
        }
    }
}

/// One background tick. Returns false once the service has been dropped.
async fn tick_in_background(
    shared: &Weak<Shared>,
    title: &str,
    records: &mpsc::UnboundedSender<SessionRecord>,
) -> bool {
    let Some(shared) = shared.upgrade() else {
        return false;
    };
    let transition = shared.scheduler.lock().await.tick();
    if let Some(transition) = transition {
        shared.announce(title, &transition);
        if let Some(record) = transition.session {
            if records.send(record).is_err() {
                tracing::error!("session writer gone; session not recorded");
            }
        }
    }
    true
}

async fn record_session(
    store: Arc<dyn SessionStore>,
    events: &broadcast::Sender<Event>,
    record: SessionRecord,
) {
    let pending = record.clone();
    let result = tokio::task::spawn_blocking(move || store.append(&pending))
        .await
        .unwrap_or_else(|e| Err(PersistenceError::WriteFailed(e.to_string())));

    match result {
        Ok(()) => {
            tracing::info!(
                date = %record.date,
                start_time = %record.start_time,
                duration_minutes = record.duration_minutes,
                "session recorded"
            );
            publish(events, Event::SessionCompleted { record });
        }
        Err(error) => {
            tracing::error!(error = %error, "failed to record session");
            publish(events, Event::SessionPersistFailed { record, error });
        }
    }
}

fn publish(events: &broadcast::Sender<Event>, event: Event) {
    // No subscribers is fine.
    let _ = events.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySessionStore;
    use crate::timer::ManualClock;
    use chrono::NaiveDate;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: StdMutex<Vec<(String, String)>>,
    }

    impl NotificationSink for RecordingNotifier {
        fn notify(&self, title: &str, message: &str) {
            self.seen
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }
    }

    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn append(&self, _record: &SessionRecord) -> Result<(), PersistenceError> {
            Err(PersistenceError::WriteFailed("read-only medium".into()))
        }

        fn list_all(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
            Ok(Vec::new())
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2026, 10, 16)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        ))
    }

    fn one_minute_cycle() -> Durations {
        Durations::new(1, 1, 1, 2).unwrap()
    }

    async fn drive_until_transition(service: &FocusService) -> PhaseTransition {
        loop {
            if let Some(t) = service.tick().await {
                return t;
            }
        }
    }

    #[tokio::test]
    async fn work_completion_persists_notifies_and_publishes() {
        let store = Arc::new(MemorySessionStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = FocusService::new(one_minute_cycle(), store.clone(), notifier.clone(), clock())
            .unwrap()
            .with_title("Test");
        let mut rx = service.subscribe();

        service.start().await;
        let t = drive_until_transition(&service).await;
        assert_eq!(t.to, Phase::ShortBreak);

        assert_eq!(store.list_all().unwrap().len(), 1);
        let seen = notifier.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![(
                "Test".to_string(),
                "Time's up! Short Break time starts now.".to_string()
            )]
        );

        assert!(matches!(rx.recv().await.unwrap(), Event::TimerStarted { .. }));
        assert!(matches!(
            rx.recv().await.unwrap(),
            Event::PhaseChanged {
                new_phase: Phase::ShortBreak,
                completed_work_phases: 1,
                ..
            }
        ));
        assert!(matches!(rx.recv().await.unwrap(), Event::SessionCompleted { .. }));
    }

    #[tokio::test]
    async fn persistence_failure_is_reported_but_transition_stands() {
        let service = FocusService::new(
            one_minute_cycle(),
            Arc::new(BrokenStore),
            Arc::new(crate::notify::NoopNotifier),
            clock(),
        )
        .unwrap();
        let mut rx = service.subscribe();

        service.start().await;
        drive_until_transition(&service).await;

        assert_eq!(service.current_phase().await, Phase::ShortBreak);
        assert_eq!(service.completed_work_count().await, 1);
        assert!(service.is_running().await);

        let _started = rx.recv().await.unwrap();
        let _changed = rx.recv().await.unwrap();
        match rx.recv().await.unwrap() {
            Event::SessionPersistFailed { record, error } => {
                assert_eq!(record.duration_minutes, 1);
                assert_eq!(
                    error,
                    PersistenceError::WriteFailed("read-only medium".into())
                );
            }
            other => panic!("Expected SessionPersistFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reset_never_records() {
        let store = Arc::new(MemorySessionStore::new());
        let service = FocusService::new(
            one_minute_cycle(),
            store.clone(),
            Arc::new(crate::notify::NoopNotifier),
            clock(),
        )
        .unwrap();
        service.start().await;
        for _ in 0..59 {
            service.tick().await;
        }
        service.reset().await;
        assert_eq!(service.remaining_seconds().await, 60);
        assert!(!service.is_running().await);
        service.tick().await;
        assert!(store.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_durations_validates() {
        let service = FocusService::new(
            one_minute_cycle(),
            Arc::new(MemorySessionStore::new()),
            Arc::new(crate::notify::NoopNotifier),
            clock(),
        )
        .unwrap();
        let bad = Durations {
            work_minutes: 0,
            ..one_minute_cycle()
        };
        assert!(service.update_durations(bad).await.is_err());
        service
            .update_durations(Durations::new(2, 1, 1, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(service.remaining_seconds().await, 120);
    }

    #[tokio::test(start_paused = true)]
    async fn background_ticker_counts_down_and_flushes_on_shutdown() {
        let store = Arc::new(MemorySessionStore::new());
        let service = FocusService::new(
            one_minute_cycle(),
            store.clone(),
            Arc::new(crate::notify::NoopNotifier),
            clock(),
        )
        .unwrap();
        let mut rx = service.subscribe();

        service.spawn().await;
        service.spawn().await;
        service.start().await;

        loop {
            if let Event::SessionCompleted { record } = rx.recv().await.unwrap() {
                assert_eq!(record.duration_minutes, 1);
                break;
            }
        }
        service.shutdown().await;
        assert_eq!(store.list_all().unwrap().len(), 1);

        let frozen = service.remaining_seconds().await;
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(service.remaining_seconds().await, frozen);
    }

    #[tokio::test]
    async fn shutdown_without_ticker_is_noop() {
        let service = FocusService::new(
            Durations::default(),
            Arc::new(MemorySessionStore::new()),
            Arc::new(crate::notify::NoopNotifier),
            clock(),
        )
        .unwrap();
        service.shutdown().await;
        assert_eq!(service.remaining_seconds().await, 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_service_stops_the_ticker() {
        let store = Arc::new(MemorySessionStore::new());
        let service = FocusService::new(
            one_minute_cycle(),
            store.clone(),
            Arc::new(crate::notify::NoopNotifier),
            clock(),
        )
        .unwrap();
        service.spawn().await;
        service.start().await;
        time::sleep(Duration::from_secs(5)).await;
        assert!(Arc::strong_count(&store) > 1);

        drop(service);
        time::sleep(Duration::from_secs(3)).await;
        // Neither the ticker nor the writer still holds the store.
        assert_eq!(Arc::strong_count(&store), 1);
    }
}
