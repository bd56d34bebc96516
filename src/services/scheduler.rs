use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::services::sync_service::SyncService;

/// Auto-sync scheduler.
///
/// `start` runs a sync immediately and then once per interval on a single
/// background task, so runs never overlap. `stop` raises the shared
/// cancellation signal: the in-flight run ends at its next checkpoint and
/// the timer is dropped.
pub struct SyncScheduler {
    service: Arc<SyncService>,
    running: Option<Running>,
}

struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    pub fn new(service: Arc<SyncService>) -> Self {
        Self {
            service,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn start(&mut self, interval: Duration) {
        if self.running.is_some() {
            warn!("Auto-sync scheduler is already running");
            return;
        }
        if interval.is_zero() {
            warn!("Auto-sync interval must be positive, scheduler not started");
            return;
        }

        info!("Starting auto-sync scheduler (interval: {:?})", interval);
        let (shutdown, signal) = watch::channel(false);
        let handle = tokio::spawn(run_periodic(self.service.clone(), interval, signal));
        self.running = Some(Running { shutdown, handle });
    }

    /// Signals cancellation and waits for the background task to finish.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        let _ = running.shutdown.send(true);
        if let Err(e) = running.handle.await {
            warn!("Auto-sync task ended abnormally: {}", e);
        }
        info!("Auto-sync scheduler stopped");
    }
}

async fn run_periodic(service: Arc<SyncService>, interval: Duration, mut signal: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    // an overrunning sync swallows the ticks it missed
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = signal.changed() => break,
            _ = ticker.tick() => {
                if *signal.borrow() {
                    break;
                }
                match service.sync_all(&signal).await {
                    Ok(stats) => {
                        info!(
                            "Auto-sync completed - Saved: {} courses, {} details | Known: {} | Failed listings: {}{}",
                            stats.courses_saved,
                            stats.details_saved,
                            stats.courses_known,
                            stats.listings_failed,
                            if stats.cancelled { " (cancelled)" } else { "" }
                        );
                    }
                    Err(e) => {
                        // the next tick retries
                        warn!("Auto-sync failed: {}", e);
                    }
                }
            }
        }
    }
}
