use async_trait::async_trait;
use tracing::info;

use super::traits::Notifier;
use crate::errors::NotifyResult;

/// Stand-in used when mail delivery is disabled: digests go to the log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        subject: &str,
        html_body: &str,
        recipients: &[String],
    ) -> NotifyResult<()> {
        info!(
            channel = "log",
            subject = %subject,
            recipients = ?recipients,
            bytes = html_body.len(),
            "digest ready (mail delivery disabled)"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
