//! SMTP delivery via `lettre`
//!
//! Port 465 uses implicit TLS, any other port uses STARTTLS when `tls` is
//! set. Credentials come from `SMTP_USERNAME` / `SMTP_PASSWORD` when both are
//! present; otherwise the connection is unauthenticated.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use super::traits::Notifier;
use crate::config::MailConfig;
use crate::errors::{NotifyError, NotifyResult};

#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailNotifier {
    pub fn from_config(config: &MailConfig) -> NotifyResult<Self> {
        let from = parse_mailbox(&config.from)?;
        let host = config.smtp_host.as_str();
        let port = config.smtp_port;

        let mut builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };

        if let (Ok(username), Ok(password)) =
            (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

fn parse_mailbox(address: &str) -> NotifyResult<Mailbox> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::Address {
            address: address.to_string(),
            message: e.to_string(),
        })
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(
        &self,
        subject: &str,
        html_body: &str,
        recipients: &[String],
    ) -> NotifyResult<()> {
        if recipients.is_empty() {
            return Err(NotifyError::Config(
                "at least one recipient is required".to_string(),
            ));
        }

        let mut message_builder = Message::builder().from(self.from.clone());
        for recipient in recipients {
            message_builder = message_builder.to(parse_mailbox(recipient)?);
        }

        let email = message_builder
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        info!(
            channel = "email",
            subject = %subject,
            recipients = recipients.len(),
            "digest delivered"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
