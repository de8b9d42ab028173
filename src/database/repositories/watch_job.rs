//! SeaORM-backed job store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::entities::{prelude::WatchJobs, watch_jobs};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::job_scheduling::{JobSchedulingError, JobStore, JobStoreResult};
use crate::models::WatchJob;

const TABLE: &str = "watch_jobs";

fn interval_ms(interval: Duration) -> RepositoryResult<i64> {
    i64::try_from(interval.as_millis())
        .ok()
        .filter(|ms| *ms > 0)
        .ok_or_else(|| RepositoryError::CorruptRecord {
            table: TABLE.to_string(),
            message: format!("interval {interval:?} cannot be stored in milliseconds"),
        })
}

pub struct WatchJobSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl WatchJobSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    fn domain_to_active_model(job: &WatchJob) -> RepositoryResult<watch_jobs::ActiveModel> {
        Ok(watch_jobs::ActiveModel {
            id: Set(job.id.to_string()),
            travel_date: Set(job.date_param()),
            from_code: Set(job.from_code.clone()),
            to_code: Set(job.to_code.clone()),
            recipients: Set(serde_json::to_string(&job.recipients)?),
            interval_ms: Set(interval_ms(job.interval)?),
            max_instances: Set(job.max_instances as i32),
            coalesce: Set(job.coalesce),
            next_run_at: Set(job.next_run_time.timestamp_millis()),
            created_at: Set(job.created_at),
        })
    }

    fn model_to_domain(model: watch_jobs::Model) -> RepositoryResult<WatchJob> {
        let corrupt = |message: String| RepositoryError::CorruptRecord {
            table: TABLE.to_string(),
            message,
        };

        let id = Uuid::parse_str(&model.id)
            .map_err(|e| corrupt(format!("id '{}': {e}", model.id)))?;
        let travel_date = NaiveDate::parse_from_str(&model.travel_date, "%Y-%m-%d")
            .map_err(|e| corrupt(format!("travel_date '{}': {e}", model.travel_date)))?;
        let next_run_time = DateTime::<Utc>::from_timestamp_millis(model.next_run_at)
            .ok_or_else(|| corrupt(format!("next_run_at {}", model.next_run_at)))?;
        let interval_ms = u64::try_from(model.interval_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| corrupt(format!("interval_ms {}", model.interval_ms)))?;
        let max_instances = u32::try_from(model.max_instances)
            .map_err(|_| corrupt(format!("max_instances {}", model.max_instances)))?;

        Ok(WatchJob {
            id,
            travel_date,
            from_code: model.from_code,
            to_code: model.to_code,
            recipients: serde_json::from_str(&model.recipients)?,
            interval: Duration::from_millis(interval_ms),
            max_instances,
            coalesce: model.coalesce,
            next_run_time,
            created_at: model.created_at,
        })
    }

    fn is_unique_violation(err: &DbErr) -> bool {
        matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    }
}

#[async_trait]
impl JobStore for WatchJobSeaOrmRepository {
    async fn add(&self, job: WatchJob) -> JobStoreResult<()> {
        let active_model = Self::domain_to_active_model(&job)?;

        match WatchJobs::insert(active_model)
            .exec(&*self.connection)
            .await
        {
            Ok(_) => {
                debug!("Stored job {}", job.id);
                Ok(())
            }
            Err(e) if Self::is_unique_violation(&e) => Err(JobSchedulingError::DuplicateJob {
                id: job.id.to_string(),
            }),
            Err(e) => Err(RepositoryError::from(e).into()),
        }
    }

    async fn remove(&self, id: Uuid) -> JobStoreResult<bool> {
        let result = WatchJobs::delete_by_id(id.to_string())
            .exec(&*self.connection)
            .await
            .map_err(RepositoryError::from)?;
        Ok(result.rows_affected > 0)
    }

    async fn get(&self, id: Uuid) -> JobStoreResult<Option<WatchJob>> {
        let model = WatchJobs::find_by_id(id.to_string())
            .one(&*self.connection)
            .await
            .map_err(RepositoryError::from)?;
        Ok(model.map(Self::model_to_domain).transpose()?)
    }

    async fn list(&self) -> JobStoreResult<Vec<WatchJob>> {
        let models = WatchJobs::find()
            .order_by_asc(watch_jobs::Column::CreatedAt)
            .order_by_asc(watch_jobs::Column::Id)
            .all(&*self.connection)
            .await
            .map_err(RepositoryError::from)?;
        Ok(models
            .into_iter()
            .map(Self::model_to_domain)
            .collect::<RepositoryResult<Vec<_>>>()?)
    }

    async fn list_due(&self, now: DateTime<Utc>) -> JobStoreResult<Vec<WatchJob>> {
        let models = WatchJobs::find()
            .filter(watch_jobs::Column::NextRunAt.lte(now.timestamp_millis()))
            .order_by_asc(watch_jobs::Column::NextRunAt)
            .order_by_asc(watch_jobs::Column::Id)
            .all(&*self.connection)
            .await
            .map_err(RepositoryError::from)?;
        Ok(models
            .into_iter()
            .map(Self::model_to_domain)
            .collect::<RepositoryResult<Vec<_>>>()?)
    }

    async fn set_next_run_time(&self, id: Uuid, next: DateTime<Utc>) -> JobStoreResult<()> {
        WatchJobs::update_many()
            .col_expr(
                watch_jobs::Column::NextRunAt,
                Expr::value(next.timestamp_millis()),
            )
            .filter(watch_jobs::Column::Id.eq(id.to_string()))
            .exec(&*self.connection)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}
