use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A standing request to poll availability for one route and date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchJob {
    pub id: Uuid,
    pub travel_date: NaiveDate,
    pub from_code: String,
    pub to_code: String,
    pub recipients: Vec<String>,
    #[serde(with = "crate::config::duration_serde")]
    pub interval: Duration,
    pub max_instances: u32,
    pub coalesce: bool,
    pub next_run_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl WatchJob {
    /// Build a job whose first firing is one interval from `now`
    pub fn new(
        id: Uuid,
        travel_date: NaiveDate,
        from_code: impl Into<String>,
        to_code: impl Into<String>,
        recipients: Vec<String>,
        policy: &JobPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            travel_date,
            from_code: from_code.into(),
            to_code: to_code.into(),
            recipients,
            interval: policy.interval,
            max_instances: policy.max_instances,
            coalesce: policy.coalesce,
            next_run_time: now + policy.interval,
            created_at: now,
        }
    }

    /// Date in the `YYYY-MM-DD` form the left-ticket endpoint expects
    pub fn date_param(&self) -> String {
        self.travel_date.format("%Y-%m-%d").to_string()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_run_time <= now
    }
}

/// Trigger settings stamped onto every new job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPolicy {
    pub interval: Duration,
    pub max_instances: u32,
    pub coalesce: bool,
}

impl Default for JobPolicy {
    fn default() -> Self {
        Self {
            interval: crate::config::defaults::DEFAULT_JOB_INTERVAL,
            max_instances: crate::config::defaults::DEFAULT_MAX_INSTANCES,
            coalesce: false,
        }
    }
}

impl From<&crate::config::SchedulerConfig> for JobPolicy {
    fn from(config: &crate::config::SchedulerConfig) -> Self {
        Self {
            interval: config.default_interval,
            max_instances: config.max_instances,
            coalesce: config.coalesce,
        }
    }
}

/// Inbound registration, stations given by display name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchRequest {
    pub date: NaiveDate,
    pub start_station: String,
    pub end_station: String,
    pub email: String,
}

/// Acknowledgement returned to the requester
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchAccepted {
    pub id: Uuid,
    pub next_run_time: DateTime<Utc>,
}
