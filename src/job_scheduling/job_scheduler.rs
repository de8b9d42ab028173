//! Interval scheduler for watch jobs
//!
//! Every `poll_interval` the store is asked for due jobs. Each due run time
//! becomes its own firing (no coalescing by default), the job's next run time
//! is advanced past `now`, and the firings go to the [`WorkerPool`]. A failed
//! firing is logged and counted; the job stays scheduled.

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::job_executor::JobExecutor;
use super::job_store::JobStore;
use super::types::{DispatchReport, FiringOutcome, JobStoreResult, SkipReason};
use super::worker_pool::WorkerPool;
use crate::config::SchedulerConfig;
use crate::models::WatchJob;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub max_workers: usize,
    pub poll_interval: Duration,
    pub misfire_grace_time: Duration,
    pub shutdown_timeout: Duration,
}

impl From<&SchedulerConfig> for SchedulerSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            max_workers: config.max_workers,
            poll_interval: config.poll_interval,
            misfire_grace_time: config.misfire_grace_time,
            shutdown_timeout: config.shutdown_timeout,
        }
    }
}

#[derive(Debug, Default)]
struct FiringStats {
    fired: AtomicU64,
    failed: AtomicU64,
    notified: AtomicU64,
    notify_failed: AtomicU64,
    skipped: AtomicU64,
    misfired: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiringStatsSnapshot {
    pub fired: u64,
    pub failed: u64,
    pub notified: u64,
    pub notify_failed: u64,
    pub skipped: u64,
    pub misfired: u64,
    pub running: usize,
}

/// Run times of one due job that should fire now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueRuns {
    pub runs: Vec<DateTime<Utc>>,
    /// Run times dropped for exceeding the misfire grace period
    pub misfired: u64,
    /// First run time strictly after `now`
    pub next: DateTime<Utc>,
}

/// Expand a job's backlog into individual run times.
pub fn due_run_times(
    next_run_time: DateTime<Utc>,
    every: Duration,
    now: DateTime<Utc>,
    grace: Duration,
    coalesce: bool,
) -> DueRuns {
    let interval_ms = (every.as_millis() as i64).max(1);
    let elapsed_ms = (now - next_run_time).num_milliseconds();
    if elapsed_ms < 0 {
        return DueRuns {
            runs: Vec::new(),
            misfired: 0,
            next: next_run_time,
        };
    }

    let total = elapsed_ms / interval_ms + 1;
    let grace_ms = grace.as_millis() as i64;
    let first = if elapsed_ms > grace_ms {
        ((elapsed_ms - grace_ms + interval_ms - 1) / interval_ms).min(total)
    } else {
        0
    };

    let at = |i: i64| next_run_time + TimeDelta::milliseconds(i * interval_ms);
    let mut runs: Vec<DateTime<Utc>> = (first..total).map(at).collect();
    if coalesce && runs.len() > 1 {
        runs.drain(..runs.len() - 1);
    }

    DueRuns {
        runs,
        misfired: first as u64,
        next: at(total),
    }
}

pub struct JobScheduler {
    store: Arc<dyn JobStore>,
    executor: Arc<JobExecutor>,
    pool: WorkerPool,
    settings: SchedulerSettings,
    stats: Arc<FiringStats>,
}

impl JobScheduler {
    pub fn new(
        store: Arc<dyn JobStore>,
        executor: Arc<JobExecutor>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            store,
            executor,
            pool: WorkerPool::new(settings.max_workers),
            settings,
            stats: Arc::new(FiringStats::default()),
        }
    }

    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        info!(
            "Starting job scheduler (workers: {}, poll every {:?})",
            self.pool.max_workers(),
            self.settings.poll_interval
        );
        let mut schedule_check = interval(self.settings.poll_interval);
        schedule_check.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = schedule_check.tick() => {
                    if let Err(e) = self.run_pending(Utc::now()).await {
                        error!("Error scheduling due jobs: {}", e);
                    }
                }
                _ = cancellation_token.cancelled() => {
                    info!("Job scheduler received cancellation signal, shutting down");
                    break;
                }
            }
        }

        info!(
            "Waiting for {} in-flight firings to complete...",
            self.pool.running_count()
        );
        if self.pool.shutdown(self.settings.shutdown_timeout).await {
            info!("All firings completed");
        }
        info!("Job scheduler stopped");
        Ok(())
    }

    /// Fire everything due at `now`
    pub async fn run_pending(&self, now: DateTime<Utc>) -> JobStoreResult<DispatchReport> {
        let due = self.store.list_due(now).await?;
        let mut report = DispatchReport::default();
        if due.is_empty() {
            return Ok(report);
        }
        debug!("{} jobs due at {}", due.len(), now);

        for job in due {
            let runs = due_run_times(
                job.next_run_time,
                job.interval,
                now,
                self.settings.misfire_grace_time,
                job.coalesce,
            );

            // A job removed since `list_due` still gets this firing; rescheduling
            // it is a no-op, so nothing fires after it.
            if let Err(e) = self.store.set_next_run_time(job.id, runs.next).await {
                warn!("Failed to reschedule job {}: {}", job.id, e);
                continue;
            }

            if runs.misfired > 0 {
                warn!(
                    "Job {} missed {} run(s) by more than {:?}, skipping them",
                    job.id, runs.misfired, self.settings.misfire_grace_time
                );
                self.stats.misfired.fetch_add(runs.misfired, Ordering::Relaxed);
                report
                    .skipped
                    .push((job.id, job.next_run_time, SkipReason::Misfired));
            }

            let job = Arc::new(job);
            for scheduled_for in runs.runs {
                match self.submit_firing(job.clone(), scheduled_for) {
                    Ok(()) => report.submitted += 1,
                    Err(reason) => {
                        warn!(
                            "Execution of job {} skipped: maximum number of running instances reached ({})",
                            job.id, job.max_instances
                        );
                        self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                        report.skipped.push((job.id, scheduled_for, reason));
                    }
                }
            }
        }

        Ok(report)
    }

    fn submit_firing(
        &self,
        job: Arc<WatchJob>,
        scheduled_for: DateTime<Utc>,
    ) -> Result<(), SkipReason> {
        let executor = self.executor.clone();
        let stats = self.stats.clone();
        let job_id = job.id;
        let max_instances = job.max_instances;

        self.pool.submit(job_id, max_instances, async move {
            stats.fired.fetch_add(1, Ordering::Relaxed);
            let start_time = Instant::now();
            let result = executor.check_tickets(&job).await;
            let duration = start_time.elapsed();

            match result {
                Ok(FiringOutcome::NothingFound) => {
                    debug!("Job {} ({}) found nothing in {:?}", job.id, scheduled_for, duration);
                }
                Ok(FiringOutcome::Notified { tickets }) => {
                    stats.notified.fetch_add(1, Ordering::Relaxed);
                    info!(
                        "Job {} ({}) notified {} recipients about {} trains in {:?}",
                        job.id,
                        scheduled_for,
                        job.recipients.len(),
                        tickets,
                        duration
                    );
                }
                Ok(FiringOutcome::NotifyFailed { tickets }) => {
                    stats.notify_failed.fetch_add(1, Ordering::Relaxed);
                    error!(
                        "Job {} ({}) found {} trains but the digest could not be delivered",
                        job.id, scheduled_for, tickets
                    );
                }
                Err(e) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    error!(
                        "Job {} ({}) failed after {:?}: {}",
                        job.id, scheduled_for, duration, e
                    );
                }
            }
        })
    }

    pub fn stats(&self) -> FiringStatsSnapshot {
        FiringStatsSnapshot {
            fired: self.stats.fired.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            notified: self.stats.notified.load(Ordering::Relaxed),
            notify_failed: self.stats.notify_failed.load(Ordering::Relaxed),
            skipped: self.stats.skipped.load(Ordering::Relaxed),
            misfired: self.stats.misfired.load(Ordering::Relaxed),
            running: self.pool.running_count(),
        }
    }

    pub fn in_flight(&self, job_id: uuid::Uuid) -> u32 {
        self.pool.in_flight(job_id)
    }

    /// Wait for every firing submitted so far to finish
    pub async fn wait_for_running_firings(&self) {
        self.pool.wait_idle().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
    }

    const MINUTE: Duration = Duration::from_secs(60);
    const GRACE: Duration = Duration::from_secs(30);

    #[test]
    fn test_single_due_run() {
        let due = due_run_times(t0(), MINUTE, t0() + TimeDelta::seconds(5), GRACE, false);
        assert_eq!(due.runs, vec![t0()]);
        assert_eq!(due.misfired, 0);
        assert_eq!(due.next, t0() + TimeDelta::seconds(60));
    }

    #[test]
    fn test_not_yet_due() {
        let due = due_run_times(t0(), MINUTE, t0() - TimeDelta::seconds(1), GRACE, false);
        assert!(due.runs.is_empty());
        assert_eq!(due.next, t0());
    }

    #[test]
    fn test_backlog_fires_each_run_within_grace() {
        let grace = Duration::from_secs(600);
        let now = t0() + TimeDelta::seconds(130);
        let due = due_run_times(t0(), MINUTE, now, grace, false);
        assert_eq!(
            due.runs,
            vec![
                t0(),
                t0() + TimeDelta::seconds(60),
                t0() + TimeDelta::seconds(120)
            ]
        );
        assert_eq!(due.next, t0() + TimeDelta::seconds(180));
    }

    #[test]
    fn test_backlog_beyond_grace_is_skipped() {
        let now = t0() + TimeDelta::seconds(130);
        let due = due_run_times(t0(), MINUTE, now, GRACE, false);
        // 0s and 60s are 130s and 70s late; 120s is 10s late
        assert_eq!(due.runs, vec![t0() + TimeDelta::seconds(120)]);
        assert_eq!(due.misfired, 2);
    }

    #[test]
    fn test_coalesce_keeps_latest_run_only() {
        let grace = Duration::from_secs(600);
        let now = t0() + TimeDelta::seconds(130);
        let due = due_run_times(t0(), MINUTE, now, grace, true);
        assert_eq!(due.runs, vec![t0() + TimeDelta::seconds(120)]);
    }
}
