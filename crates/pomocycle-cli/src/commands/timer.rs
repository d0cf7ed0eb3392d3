use std::sync::Arc;

use clap::Args;
use pomocycle_core::{
    Config, Database, Durations, Event, FocusService, LogNotifier, NoopNotifier,
    NotificationSink, SystemClock,
};
use tokio::sync::broadcast::error::RecvError;

#[derive(Args)]
pub struct RunArgs {
    /// Work phase length in minutes
    #[arg(long)]
    work: Option<u32>,
    /// Short break length in minutes
    #[arg(long)]
    short_break: Option<u32>,
    /// Long break length in minutes
    #[arg(long)]
    long_break: Option<u32>,
    /// Work phases between long breaks
    #[arg(long)]
    long_every: Option<u32>,
}

impl RunArgs {
    fn durations(&self, config: &Config) -> Result<Durations, pomocycle_core::ValidationError> {
        let base = config.durations()?;
        Durations::new(
            self.work.unwrap_or(base.work_minutes),
            self.short_break.unwrap_or(base.short_break_minutes),
            self.long_break.unwrap_or(base.long_break_minutes),
            self.long_every.unwrap_or(base.work_phases_per_long_break),
        )
    }
}

/// Run until Ctrl-C, printing every event as a JSON line.
pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let durations = args.durations(&config)?;
    let store = Arc::new(Database::open()?);
    let notifier: Arc<dyn NotificationSink> = if config.notifications.enabled {
        Arc::new(LogNotifier)
    } else {
        Arc::new(NoopNotifier)
    };

    let service = FocusService::new(durations, store, notifier, Arc::new(SystemClock))?
        .with_title(config.notifications.title.clone());
    let mut events = service.subscribe();

    service.spawn().await;
    service.start().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(event) => print_event(&event)?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    service.pause().await;
    service.shutdown().await;
    println!("{}", serde_json::to_string(&service.snapshot().await)?);
    Ok(())
}

fn print_event(event: &Event) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
