//! Work performed by a single firing: query, filter, notify.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::FiringOutcome;
use crate::errors::QueryError;
use crate::models::{Ticket, WatchJob};
use crate::notifications::NotificationDispatcher;
use crate::sources::AvailabilityQueryClient;
use crate::utils::{RetryPolicy, with_retry};

pub struct JobExecutor {
    client: Arc<dyn AvailabilityQueryClient>,
    dispatcher: Arc<NotificationDispatcher>,
    retry: RetryPolicy,
    only_with_seats: bool,
}

impl JobExecutor {
    pub fn new(
        client: Arc<dyn AvailabilityQueryClient>,
        dispatcher: Arc<NotificationDispatcher>,
        retry: RetryPolicy,
        only_with_seats: bool,
    ) -> Self {
        Self {
            client,
            dispatcher,
            retry,
            only_with_seats,
        }
    }

    /// Query availability for `job` under the retry policy and send a digest
    /// if anything turned up.
    ///
    /// Returns the query error once retries are exhausted. A notification
    /// failure is not an error here; it is reported in the outcome.
    pub async fn check_tickets(&self, job: &WatchJob) -> Result<FiringOutcome, QueryError> {
        let date = job.date_param();
        let tickets = with_retry(
            &self.retry,
            || self.client.query(&date, &job.from_code, &job.to_code),
            "left ticket query",
        )
        .await?;

        let tickets: Vec<Ticket> = if self.only_with_seats {
            tickets.into_iter().filter(Ticket::has_any_seat).collect()
        } else {
            tickets
        };

        if tickets.is_empty() {
            debug!(
                "Job {}: nothing available {} {}->{}",
                job.id, date, job.from_code, job.to_code
            );
            return Ok(FiringOutcome::NothingFound);
        }

        info!(
            "Job {}: {} trains with seats on {} {}->{}",
            job.id,
            tickets.len(),
            date,
            job.from_code,
            job.to_code
        );

        let count = tickets.len();
        match self.dispatcher.notify(&tickets, &job.recipients).await {
            Ok(_) => Ok(FiringOutcome::Notified { tickets: count }),
            Err(e) => {
                warn!(
                    "Job {}: digest for {} trains not sent: {}",
                    job.id, count, e
                );
                Ok(FiringOutcome::NotifyFailed { tickets: count })
            }
        }
    }
}
