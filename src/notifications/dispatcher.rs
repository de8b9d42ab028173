use std::sync::Arc;
use tracing::{debug, warn};

use super::templating::DigestRenderer;
use super::traits::Notifier;
use crate::errors::NotifyResult;
use crate::models::Ticket;

/// Renders a digest for a firing's tickets and hands it to the notifier.
///
/// Failures are reported to the caller and never retried here.
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    renderer: DigestRenderer,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> NotifyResult<Self> {
        Ok(Self {
            notifier,
            renderer: DigestRenderer::new()?,
        })
    }

    /// Send one digest for `tickets` to every recipient. Returns `false`
    /// without sending when `tickets` is empty.
    pub async fn notify(&self, tickets: &[Ticket], recipients: &[String]) -> NotifyResult<bool> {
        let Some(first) = tickets.first() else {
            debug!("No tickets, nothing to notify");
            return Ok(false);
        };

        let digest = self.renderer.render(&first.date, tickets)?;
        if let Err(e) = self
            .notifier
            .send(&digest.subject, &digest.html, recipients)
            .await
        {
            warn!(
                channel = self.notifier.channel_name(),
                subject = %digest.subject,
                error = %e,
                "digest delivery failed"
            );
            return Err(e);
        }
        Ok(true)
    }

    pub fn channel_name(&self) -> &str {
        self.notifier.channel_name()
    }
}
