use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::job_store::JobStore;
use super::types::{JobSchedulingError, JobStoreResult};
use crate::models::{JobPolicy, WatchJob, WatchRequest};
use crate::stations::StationDirectory;

/// Facade used by the web layer and the CLI to manage watch jobs
pub struct JobSchedulingAPI {
    store: Arc<dyn JobStore>,
    stations: Arc<dyn StationDirectory>,
    policy: JobPolicy,
}

impl JobSchedulingAPI {
    pub fn new(
        store: Arc<dyn JobStore>,
        stations: Arc<dyn StationDirectory>,
        policy: JobPolicy,
    ) -> Self {
        Self {
            store,
            stations,
            policy,
        }
    }

    /// Register a request under a fresh time-ordered id
    pub async fn register(&self, request: WatchRequest) -> JobStoreResult<WatchJob> {
        self.register_with_id(Uuid::now_v7(), request, Utc::now())
            .await
    }

    /// Register a request under a caller-chosen id. Fails with `DuplicateJob`
    /// if the id is already registered.
    pub async fn register_with_id(
        &self,
        id: Uuid,
        request: WatchRequest,
        now: DateTime<Utc>,
    ) -> JobStoreResult<WatchJob> {
        let email = request.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(JobSchedulingError::InvalidJob {
                reason: format!("'{}' is not an email address", request.email),
            });
        }

        let from_code = self.resolve_station(&request.start_station).await?;
        let to_code = self.resolve_station(&request.end_station).await?;
        if from_code == to_code {
            return Err(JobSchedulingError::InvalidJob {
                reason: "start and end station are the same".to_string(),
            });
        }

        let job = WatchJob::new(
            id,
            request.date,
            from_code,
            to_code,
            vec![email.to_string()],
            &self.policy,
            now,
        );
        self.store.add(job.clone()).await?;

        info!(
            "Registered job {} for {} {}->{} (every {:?})",
            job.id,
            job.date_param(),
            job.from_code,
            job.to_code,
            job.interval
        );
        Ok(job)
    }

    async fn resolve_station(&self, name: &str) -> JobStoreResult<String> {
        self.stations
            .code_for_name(name)
            .await?
            .ok_or_else(|| JobSchedulingError::UnknownStation {
                name: name.to_string(),
            })
    }

    /// Stop future firings of `id`. In-flight firings run to completion.
    pub async fn remove(&self, id: Uuid) -> JobStoreResult<()> {
        if self.store.remove(id).await? {
            info!("Removed job {}", id);
            Ok(())
        } else {
            Err(JobSchedulingError::JobNotFound { id: id.to_string() })
        }
    }

    pub async fn get(&self, id: Uuid) -> JobStoreResult<WatchJob> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| JobSchedulingError::JobNotFound { id: id.to_string() })
    }

    pub async fn list(&self) -> JobStoreResult<Vec<WatchJob>> {
        self.store.list().await
    }
}
