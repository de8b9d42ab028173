//! Bounded execution of firings
//!
//! Two limits apply. A process-wide semaphore caps how many firings execute
//! at once (excess firings wait for a worker), and a per-job counter caps how
//! many firings of the same job may be in flight (excess firings are
//! rejected up front).

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};
use uuid::Uuid;

use super::types::SkipReason;

type InFlight = Arc<Mutex<HashMap<Uuid, u32>>>;

pub struct WorkerPool {
    workers: Arc<Semaphore>,
    max_workers: usize,
    in_flight: InFlight,
    tracker: TaskTracker,
}

/// Releases one per-job slot when the firing finishes, panics included
struct InstanceSlot {
    job_id: Uuid,
    in_flight: InFlight,
}

impl Drop for InstanceSlot {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = in_flight.get_mut(&self.job_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                in_flight.remove(&self.job_id);
            }
        }
    }
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        Self {
            workers: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            tracker: TaskTracker::new(),
        }
    }

    /// Start `work` as a firing of `job_id` unless the job already has
    /// `max_instances` firings in flight.
    pub fn submit<F>(&self, job_id: Uuid, max_instances: u32, work: F) -> Result<(), SkipReason>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            let count = in_flight.entry(job_id).or_insert(0);
            if *count >= max_instances {
                return Err(SkipReason::MaxInstancesReached);
            }
            *count += 1;
        }

        let slot = InstanceSlot {
            job_id,
            in_flight: self.in_flight.clone(),
        };
        let workers = self.workers.clone();

        self.tracker.spawn(async move {
            let _slot = slot;
            let Ok(_permit) = workers.acquire_owned().await else {
                debug!("Worker pool closed before job {} got a worker", job_id);
                return;
            };
            work.await;
        });
        Ok(())
    }

    pub fn in_flight(&self, job_id: Uuid) -> u32 {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&job_id)
            .copied()
            .unwrap_or(0)
    }

    /// Firings submitted and not yet finished, across every job
    pub fn running_count(&self) -> usize {
        self.tracker.len()
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Wait until every submitted firing has finished. New submissions are
    /// still accepted afterwards.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Wait up to `timeout` for in-flight firings. Returns `false` on timeout.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    "Timeout waiting for {} firings to complete, proceeding with shutdown",
                    self.tracker.len()
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_per_job_cap_rejects_excess_firings() {
        let pool = WorkerPool::new(20);
        let gate = CancellationToken::new();
        let job_id = Uuid::now_v7();

        for _ in 0..3 {
            let gate = gate.clone();
            pool.submit(job_id, 3, async move { gate.cancelled().await })
                .unwrap();
        }
        assert_eq!(pool.in_flight(job_id), 3);
        assert_eq!(
            pool.submit(job_id, 3, async {}),
            Err(SkipReason::MaxInstancesReached)
        );

        // a different job is unaffected
        pool.submit(Uuid::now_v7(), 3, async {}).unwrap();

        gate.cancel();
        pool.wait_idle().await;
        assert_eq!(pool.in_flight(job_id), 0);
        assert_eq!(pool.running_count(), 0);
    }

    #[tokio::test]
    async fn test_global_cap_limits_concurrency() {
        let pool = WorkerPool::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..6 {
            let active = active.clone();
            let peak = peak.clone();
            pool.submit(Uuid::now_v7(), 3, async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        pool.wait_idle().await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }
}
