//! Durable registry of active watch jobs
//!
//! The scheduler only ever talks to [`JobStore`]. Production uses the SeaORM
//! implementation in `database::repositories::watch_job`; tests and
//! ephemeral runs can use [`InMemoryJobStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::{JobSchedulingError, JobStoreResult};
use crate::models::WatchJob;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Register `job`. Fails with `DuplicateJob` if the id is taken.
    async fn add(&self, job: WatchJob) -> JobStoreResult<()>;

    /// Returns whether a job was actually removed
    async fn remove(&self, id: Uuid) -> JobStoreResult<bool>;

    async fn get(&self, id: Uuid) -> JobStoreResult<Option<WatchJob>>;

    async fn list(&self) -> JobStoreResult<Vec<WatchJob>>;

    /// Jobs whose next run time is at or before `now`
    async fn list_due(&self, now: DateTime<Utc>) -> JobStoreResult<Vec<WatchJob>>;

    /// Move a job's next run time. Silently does nothing if the job is gone.
    async fn set_next_run_time(&self, id: Uuid, next: DateTime<Utc>) -> JobStoreResult<()>;
}

/// Process-local job store
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobStore {
    jobs: Arc<RwLock<HashMap<Uuid, WatchJob>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn add(&self, job: WatchJob) -> JobStoreResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(JobSchedulingError::DuplicateJob {
                id: job.id.to_string(),
            });
        }
        jobs.insert(job.id, job);
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> JobStoreResult<bool> {
        Ok(self.jobs.write().await.remove(&id).is_some())
    }

    async fn get(&self, id: Uuid) -> JobStoreResult<Option<WatchJob>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn list(&self) -> JobStoreResult<Vec<WatchJob>> {
        let mut jobs: Vec<WatchJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by_key(|job| (job.created_at, job.id));
        Ok(jobs)
    }

    async fn list_due(&self, now: DateTime<Utc>) -> JobStoreResult<Vec<WatchJob>> {
        let mut due: Vec<WatchJob> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|job| (job.next_run_time, job.id));
        Ok(due)
    }

    async fn set_next_run_time(&self, id: Uuid, next: DateTime<Utc>) -> JobStoreResult<()> {
        if let Some(job) = self.jobs.write().await.get_mut(&id) {
            job.next_run_time = next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobPolicy;
    use chrono::{NaiveDate, TimeZone};

    fn job(id: Uuid, now: DateTime<Utc>) -> WatchJob {
        WatchJob::new(
            id,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            "BJP",
            "SHH",
            vec!["rider@example.com".to_string()],
            &JobPolicy::default(),
            now,
        )
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = InMemoryJobStore::new();
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
        let id = Uuid::now_v7();

        store.add(job(id, now)).await.unwrap();
        let err = store.add(job(id, now)).await.unwrap_err();
        assert!(matches!(err, JobSchedulingError::DuplicateJob { .. }));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_identical_parameters_are_not_merged() {
        let store = InMemoryJobStore::new();
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());

        store.add(job(a, now)).await.unwrap();
        store.add(job(b, now)).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);

        assert!(store.remove(a).await.unwrap());
        assert!(!store.remove(a).await.unwrap());
        let remaining = store.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b);
    }

    #[tokio::test]
    async fn test_list_due_and_reschedule() {
        let store = InMemoryJobStore::new();
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
        let id = Uuid::now_v7();
        store.add(job(id, now)).await.unwrap();

        assert!(store.list_due(now).await.unwrap().is_empty());
        let later = now + chrono::Duration::seconds(60);
        assert_eq!(store.list_due(later).await.unwrap().len(), 1);

        store
            .set_next_run_time(id, later + chrono::Duration::seconds(60))
            .await
            .unwrap();
        assert!(store.list_due(later).await.unwrap().is_empty());

        store.remove(id).await.unwrap();
        store.set_next_run_time(id, later).await.unwrap();
        assert!(store.get(id).await.unwrap().is_none());
    }
}
