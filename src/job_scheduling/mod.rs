//! Job scheduling subsystem
//!
//! - `JobStore`: durable registry of watch jobs (SeaORM or in-memory)
//! - `JobScheduler`: scans the store and turns due run times into firings
//! - `WorkerPool`: global worker cap plus per-job instance cap
//! - `JobExecutor`: query, filter and notify for one firing
//! - `JobSchedulingAPI`: registration facade for the web layer and CLI

pub mod api;
pub mod job_executor;
pub mod job_scheduler;
pub mod job_store;
pub mod types;
pub mod worker_pool;

pub use api::JobSchedulingAPI;
pub use job_executor::JobExecutor;
pub use job_scheduler::{FiringStatsSnapshot, JobScheduler, SchedulerSettings, due_run_times};
pub use job_store::{InMemoryJobStore, JobStore};
pub use types::*;
pub use worker_pool::WorkerPool;
