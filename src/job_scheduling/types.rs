use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::errors::RepositoryError;

pub type JobStoreResult<T> = Result<T, JobSchedulingError>;

/// Result of one scan of the job store
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// Firings handed to the worker pool
    pub submitted: usize,
    pub skipped: Vec<(Uuid, DateTime<Utc>, SkipReason)>,
}

/// What a completed firing did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FiringOutcome {
    /// Nothing with seats; nobody was told
    NothingFound,
    /// A digest of `tickets` trains went out
    Notified { tickets: usize },
    /// Tickets were found but the digest could not be delivered
    NotifyFailed { tickets: usize },
}

/// Why a due firing did not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The job already has `max_instances` firings in flight
    MaxInstancesReached,
    /// The run time is older than the misfire grace period
    Misfired,
}

#[derive(Error, Debug)]
pub enum JobSchedulingError {
    #[error("Job with id '{id}' already exists")]
    DuplicateJob { id: String },

    #[error("Job with id '{id}' not found")]
    JobNotFound { id: String },

    #[error("Unknown station '{name}'")]
    UnknownStation { name: String },

    #[error("Invalid job configuration: {reason}")]
    InvalidJob { reason: String },

    #[error("Job store operation failed: {0}")]
    Repository(#[from] RepositoryError),
}
