//! Wiring of the long-lived services built once at startup

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::database::Database;
use crate::database::repositories::{StationSeaOrmRepository, WatchJobSeaOrmRepository};
use crate::job_scheduling::{
    JobExecutor, JobScheduler, JobSchedulingAPI, JobStore, SchedulerSettings,
};
use crate::models::JobPolicy;
use crate::notifications::{EmailNotifier, LogNotifier, NotificationDispatcher, Notifier};
use crate::sources::{AvailabilityQueryClient, LeftTicketClient};
use crate::stations::StationDirectory;
use crate::utils::RetryPolicy;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub database: Option<Database>,
    pub jobs: Arc<JobSchedulingAPI>,
    pub scheduler: Arc<JobScheduler>,
}

/// Collaborators an [`AppContext`] is assembled from
pub struct AppParts {
    pub store: Arc<dyn JobStore>,
    pub stations: Arc<dyn StationDirectory>,
    pub client: Arc<dyn AvailabilityQueryClient>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppContext {
    /// Production wiring: SeaORM-backed store and stations, the left-ticket
    /// client, and SMTP delivery when mail is enabled.
    pub fn from_database(config: Config, database: Database) -> Result<Self> {
        let connection = database.connection();

        let client = LeftTicketClient::new(&config.query)
            .context("Failed to build HTTP client for the left-ticket endpoint")?;

        let notifier: Arc<dyn Notifier> = if config.mail.enabled {
            info!(
                "Mail delivery via {}:{}",
                config.mail.smtp_host, config.mail.smtp_port
            );
            Arc::new(EmailNotifier::from_config(&config.mail)?)
        } else {
            info!("Mail delivery disabled, digests will be logged");
            Arc::new(LogNotifier)
        };

        let parts = AppParts {
            store: Arc::new(WatchJobSeaOrmRepository::new(connection.clone())),
            stations: Arc::new(StationSeaOrmRepository::new(connection)),
            client: Arc::new(client),
            notifier,
        };
        Self::from_parts(config, Some(database), parts)
    }

    pub fn from_parts(config: Config, database: Option<Database>, parts: AppParts) -> Result<Self> {
        let dispatcher = Arc::new(NotificationDispatcher::new(parts.notifier)?);
        let executor = Arc::new(JobExecutor::new(
            parts.client,
            dispatcher,
            RetryPolicy::from(&config.retry),
            config.scheduler.notify_only_with_seats,
        ));

        let scheduler = Arc::new(JobScheduler::new(
            parts.store.clone(),
            executor,
            SchedulerSettings::from(&config.scheduler),
        ));
        let jobs = Arc::new(JobSchedulingAPI::new(
            parts.store,
            parts.stations,
            JobPolicy::from(&config.scheduler),
        ));

        Ok(Self {
            config: Arc::new(config),
            database,
            jobs,
            scheduler,
        })
    }
}
