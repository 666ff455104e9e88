use crate::ai::ChatCompletion;
use crate::config::ScheduleConfig;
use crate::pipeline::run_daily_pipeline;
use crate::sources::Collector;
use crate::store::Store;
use crate::types::{PipelineOutcome, Result};
use crate::utils::today_date;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// At-most-once-per-day guard. The day stamp is claimed *before* a run
/// starts, so a second near-simultaneous fire for the same day is
/// suppressed; a failed run releases the stamp to allow a retry.
#[derive(Debug, Default)]
pub struct DayGuard {
    last_run: Mutex<Option<NaiveDate>>,
}

impl DayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `day`. Returns false when that day has already been claimed.
    pub fn claim(&self, day: NaiveDate) -> bool {
        let mut last_run = self.last_run.lock().unwrap();
        if *last_run == Some(day) {
            return false;
        }
        *last_run = Some(day);
        true
    }

    /// Release `day` so a later tick or manual retry can attempt it again.
    pub fn release(&self, day: NaiveDate) {
        let mut last_run = self.last_run.lock().unwrap();
        if *last_run == Some(day) {
            *last_run = None;
        }
    }
}

/// Milliseconds until the next occurrence of hour:minute (today if not yet
/// passed, else tomorrow). Recomputed from the current wall clock on every
/// loop iteration so execution time never accumulates as drift.
pub fn ms_until_next(now: DateTime<Local>, hour: u32, minute: u32) -> u64 {
    let now_local = now.naive_local();
    let mut target = now
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .unwrap_or(now_local);
    if target <= now_local {
        target += ChronoDuration::days(1);
    }
    (target - now_local).num_milliseconds().max(0) as u64
}

/// Free-running in-process scheduler that fires the daily pipeline at a
/// configured local time, at most once per calendar day. All state is owned
/// by the instance; tests construct isolated schedulers.
pub struct Scheduler {
    schedule: ScheduleConfig,
    guard: DayGuard,
    store: Arc<Store>,
    ai: Arc<dyn ChatCompletion>,
    collectors: Arc<Vec<Box<dyn Collector>>>,
}

impl Scheduler {
    pub fn new(
        schedule: ScheduleConfig,
        store: Arc<Store>,
        ai: Arc<dyn ChatCompletion>,
        collectors: Arc<Vec<Box<dyn Collector>>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            schedule,
            guard: DayGuard::new(),
            store,
            ai,
            collectors,
        })
    }

    /// Run the pipeline for `day` behind the day guard. Returns None when
    /// the day has already run. Manual triggers share this path with the
    /// timed loop, so double fires for one day execute once.
    pub async fn run_guarded(&self, day: NaiveDate) -> Result<Option<PipelineOutcome>> {
        if !self.guard.claim(day) {
            info!("scheduler: {} already ran today, skipping", day);
            return Ok(None);
        }

        info!("scheduler: starting daily run for {}", day);
        match run_daily_pipeline(&self.store, self.ai.as_ref(), &self.collectors, day).await {
            Ok(outcome) => {
                info!(
                    "scheduler: run finished, {} articles, report {}",
                    outcome.articles_count,
                    if outcome.report_generated { "generated" } else { "not generated" }
                );
                Ok(Some(outcome))
            }
            Err(e) => {
                error!("scheduler: run failed: {}", e);
                // Allow the next tick or a manual retry to reclaim the day.
                self.guard.release(day);
                Err(e)
            }
        }
    }

    /// Spawn the timer loop. Survives indefinitely; each iteration computes
    /// the delay from the current wall clock.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            "scheduler: started, firing daily at {:02}:{:02}",
            self.schedule.hour, self.schedule.minute
        );

        tokio::spawn(async move {
            loop {
                let delay =
                    ms_until_next(Local::now(), self.schedule.hour, self.schedule.minute);
                info!("scheduler: next run in {} minutes", delay / 60_000);
                tokio::time::sleep(Duration::from_millis(delay)).await;

                // Failures are already logged and the day stamp released.
                let _ = self.run_guarded(today_date()).await;
            }
        })
    }
}
