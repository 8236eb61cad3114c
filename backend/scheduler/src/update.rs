//! Filter update scheduler.
//!
//! Waits [`UpdateScheduler::INIT_DELAY`] after the first launch and forces
//! one update, then checks every [`UpdateScheduler::CHECK_PERIOD`]. Each
//! invocation is independent: a failed run is logged and the next one is
//! scheduled as usual.

use async_trait::async_trait;
use blockwarden_config::FiltersUpdatePeriod;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info};

/// Work performed on each scheduler tick.
#[async_trait]
pub trait UpdateTask: Send + Sync {
    /// `forced` is set for the one-off update after the first launch.
    async fn run(&self, forced: bool) -> anyhow::Result<()>;
}

pub struct UpdateScheduler {
    task: Arc<dyn UpdateTask>,
    init_delay: Duration,
    check_period: Duration,
}

impl UpdateScheduler {
    pub const INIT_DELAY: Duration = Duration::from_secs(5 * 60);
    pub const CHECK_PERIOD: Duration = Duration::from_secs(30 * 60);

    pub fn new(task: Arc<dyn UpdateTask>) -> Self {
        Self {
            task,
            init_delay: Self::INIT_DELAY,
            check_period: Self::CHECK_PERIOD,
        }
    }

    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    pub fn with_check_period(mut self, period: Duration) -> Self {
        self.check_period = period;
        self
    }

    /// Run the loop on a background task.
    pub fn spawn(self, is_first_run: bool, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(is_first_run, shutdown))
    }

    /// Run until `shutdown` turns `true` or its sender is dropped.
    pub async fn run(self, is_first_run: bool, mut shutdown: watch::Receiver<bool>) {
        info!(
            init_delay_secs = self.init_delay.as_secs(),
            check_period_secs = self.check_period.as_secs(),
            is_first_run,
            "Starting update scheduler"
        );

        let start = Instant::now();
        let mut forced_at = is_first_run.then(|| start + self.init_delay);
        let mut next_check = start + self.check_period;

        loop {
            let forced_deadline = forced_at.unwrap_or(next_check);
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Update scheduler shutting down");
                        break;
                    }
                }
                _ = time::sleep_until(forced_deadline), if forced_at.is_some() => {
                    forced_at = None;
                    self.invoke(true).await;
                }
                _ = time::sleep_until(next_check) => {
                    self.invoke(false).await;
                    next_check = Instant::now() + self.check_period;
                }
            }
        }
    }

    async fn invoke(&self, forced: bool) {
        debug!(forced, "Running scheduled update");
        match self.task.run(forced).await {
            Ok(()) => info!(forced, "Scheduled update completed"),
            Err(e) => error!(error = %format!("{e:#}"), forced, "Scheduled update failed"),
        }
    }
}

/// Whether enough time has passed since `last_check` for `period`.
///
/// Auto-update off is never due; a missing last check always is.
pub fn is_update_due(
    period: FiltersUpdatePeriod,
    last_check: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    let Some(interval) = period.interval() else {
        return false;
    };
    let Some(last_check) = last_check else {
        return true;
    };
    match (now - last_check).to_std() {
        Ok(elapsed) => elapsed >= interval,
        // Last check lies in the future (clock moved back).
        Err(_) => false,
    }
}
