//! Stress tests for the tick/command lock discipline.
//!
//! A ticker task and a foreground task hammer the same service. Whatever the
//! interleaving, the countdown must stay inside its phase bounds and every
//! completed Work phase must be recorded exactly once. A store that blocks
//! on append must not hold up the countdown.

use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use pomocycle_core::{
    Durations, Event, FocusService, ManualClock, MemorySessionStore, NoopNotifier,
    PersistenceError, Phase, SessionRecord, SessionStore,
};

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
    ))
}

fn service(store: Arc<MemorySessionStore>) -> FocusService {
    FocusService::new(
        Durations::new(1, 1, 1, 3).unwrap(),
        store,
        Arc::new(NoopNotifier),
        clock(),
    )
    .unwrap()
}

/// Appends block until the test opens the gate (or drops its sender).
struct GatedStore {
    gate: Mutex<mpsc::Receiver<()>>,
    inner: MemorySessionStore,
}

impl SessionStore for GatedStore {
    fn append(&self, record: &SessionRecord) -> Result<(), PersistenceError> {
        let _ = self.gate.lock().unwrap().recv();
        self.inner.append(record)
    }

    fn list_all(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
        self.inner.list_all()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pause_racing_tick_keeps_state_consistent() {
    let store = Arc::new(MemorySessionStore::new());
    let service = service(store.clone());
    let mut events = service.subscribe();
    service.start().await;

    let ticker = {
        let service = service.clone();
        tokio::spawn(async move {
            let mut work_completions = 0u64;
            for _ in 0..20_000 {
                if let Some(t) = service.tick().await {
                    if t.from == Phase::Work {
                        work_completions += 1;
                    }
                }
            }
            work_completions
        })
    };

    let foreground = {
        let service = service.clone();
        tokio::spawn(async move {
            for i in 0..5_000 {
                if i % 2 == 0 {
                    service.pause().await;
                } else {
                    service.start().await;
                }
                let snap = service.snapshot().await;
                assert!(snap.remaining_seconds >= 1);
                assert!(snap.remaining_seconds <= snap.phase_seconds);
                tokio::task::yield_now().await;
            }
            service.start().await;
        })
    };

    foreground.await.unwrap();
    let work_completions = ticker.await.unwrap();

    let snap = service.snapshot().await;
    assert!(snap.remaining_seconds >= 1 && snap.remaining_seconds <= snap.phase_seconds);

    let records = store.list_all().unwrap();
    assert_eq!(records.len() as u64, work_completions);
    assert_eq!(service.completed_work_count().await, work_completions);

    let mut session_events = 0u64;
    while let Ok(event) = events.try_recv() {
        if matches!(event, Event::SessionCompleted { .. }) {
            session_events += 1;
        }
    }
    // The channel drops events when a receiver lags, so this is an upper bound.
    assert!(session_events <= work_completions);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reset_racing_tick_never_records_partial_sessions() {
    let store = Arc::new(MemorySessionStore::new());
    let service = service(store.clone());
    service.start().await;

    let ticker = {
        let service = service.clone();
        tokio::spawn(async move {
            let mut recorded = 0u64;
            for _ in 0..10_000 {
                if let Some(t) = service.tick().await {
                    recorded += u64::from(t.session.is_some());
                }
            }
            recorded
        })
    };

    let resetter = {
        let service = service.clone();
        tokio::spawn(async move {
            for _ in 0..2_000 {
                service.reset().await;
                service.start().await;
                let snap = service.snapshot().await;
                assert!(snap.remaining_seconds <= snap.phase_seconds);
                tokio::task::yield_now().await;
            }
        })
    };

    resetter.await.unwrap();
    let recorded = ticker.await.unwrap();

    assert_eq!(store.list_all().unwrap().len() as u64, recorded);
    assert!(store
        .list_all()
        .unwrap()
        .iter()
        .all(|r| r.duration_minutes == 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_append_does_not_stall_countdown() {
    let (open_gate, gate) = mpsc::channel();
    let store = Arc::new(GatedStore {
        gate: Mutex::new(gate),
        inner: MemorySessionStore::new(),
    });
    let service = FocusService::new(
        Durations::new(1, 5, 5, 4).unwrap(),
        store.clone(),
        Arc::new(NoopNotifier),
        clock(),
    )
    .unwrap()
    .with_tick_interval(Duration::from_millis(10));
    let mut events = service.subscribe();

    service.spawn().await;
    service.start().await;
    loop {
        if let Event::PhaseChanged {
            new_phase: Phase::ShortBreak,
            ..
        } = events.recv().await.unwrap()
        {
            break;
        }
    }

    // The Work session is now stuck in its append.
    let at_transition = service.remaining_seconds().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    let during_append = service.remaining_seconds().await;
    assert!(store.list_all().unwrap().is_empty());
    assert!(
        during_append + 10 <= at_transition,
        "countdown stalled during append: {at_transition} -> {during_append}"
    );

    open_gate.send(()).unwrap();
    service.shutdown().await;

    let records = store.list_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].duration_minutes, 1);
    let mut completed = false;
    while let Ok(event) = events.try_recv() {
        completed |= matches!(event, Event::SessionCompleted { .. });
    }
    assert!(completed);
}
