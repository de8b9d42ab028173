use async_trait::async_trait;

use crate::errors::NotifyResult;

/// Delivery channel for rendered digests
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, html_body: &str, recipients: &[String])
    -> NotifyResult<()>;

    fn channel_name(&self) -> &str;
}
