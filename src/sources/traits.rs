//! Seam between the scheduler and whatever answers availability queries.

use async_trait::async_trait;

use crate::errors::QueryResult;
use crate::models::Ticket;

/// Answers "which trains run from `start_code` to `end_code` on `date`"
///
/// An empty vector is a valid answer. Only transport problems are errors;
/// anything the implementation cannot make sense of degrades to empty.
#[async_trait]
pub trait AvailabilityQueryClient: Send + Sync {
    async fn query(&self, date: &str, start_code: &str, end_code: &str)
    -> QueryResult<Vec<Ticket>>;
}
