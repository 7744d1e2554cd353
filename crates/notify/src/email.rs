//! SMTP email notifier via `lettre` with TLS support.
//!
//! Delivers escalations as individual emails, one message per recipient, so
//! that a failing recipient is logged on its own and never blocks the rest.

use crate::traits::{Notification, Notifier, NotifyError};
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

/// Sends escalations as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    /// Async SMTP transport for sending emails.
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Sender mailbox.
    from: Mailbox,
}

impl EmailNotifier {
    /// Build an `EmailNotifier` from SMTP configuration.
    ///
    /// - `smtp_host`: SMTP server hostname.
    /// - `smtp_port`: Optional port (defaults to 587).
    /// - `tls`: Whether to use TLS. `None` or `Some(true)` enables STARTTLS;
    ///   port 465 always uses TLS regardless of this flag.
    /// - `from`: Sender email address (e.g. `"alerts@example.com"` or
    ///   `"Vigil <alerts@example.com>"`).
    ///
    /// Recipients are not fixed at construction time: each [`Notification`]
    /// carries the audience resolved at fire time.
    ///
    /// SMTP credentials are resolved from the `SMTP_USERNAME` and `SMTP_PASSWORD`
    /// environment variables. If both are set, they are passed to the transport;
    /// otherwise the connection is unauthenticated.
    pub fn from_config(
        smtp_host: &str,
        smtp_port: Option<u16>,
        tls: Option<bool>,
        from: &str,
    ) -> Result<Self, NotifyError> {
        let from_mailbox: Mailbox = from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let port = smtp_port.unwrap_or(587);
        let use_tls = tls.unwrap_or(true);

        let mut builder = if port == 465 || use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host).port(port)
        };

        // Attach credentials from environment if available.
        if let (Ok(username), Ok(password)) =
            (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        let transport = builder.build();

        Ok(Self {
            transport,
            from: from_mailbox,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    /// Send the escalation to every recipient on the notification.
    ///
    /// Failures are logged per recipient; the send only errors when no
    /// recipient could be delivered to at all.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.recipients.is_empty() {
            return Err(NotifyError::Config(
                "notification has no recipients".to_string(),
            ));
        }

        let mut delivered = 0usize;
        let mut failed = 0usize;

        for recipient in &notification.recipients {
            let mailbox: Mailbox = match recipient.email.parse() {
                Ok(mb) => mb,
                Err(e) => {
                    tracing::warn!(
                        channel = "email",
                        recipient = %recipient.email,
                        error = %e,
                        "invalid recipient address, skipping"
                    );
                    failed += 1;
                    continue;
                }
            };

            let email = Message::builder()
                .from(self.from.clone())
                .to(mailbox)
                .subject(&notification.subject)
                .body(notification.body.clone())
                .map_err(|e| NotifyError::Smtp(e.to_string()))?;

            match self.transport.send(email).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        channel = "email",
                        recipient = %recipient.email,
                        error = %e,
                        "escalation email failed"
                    );
                    failed += 1;
                }
            }
        }

        if delivered == 0 {
            return Err(NotifyError::AllRecipientsFailed { failed });
        }

        tracing::info!(
            channel = "email",
            subject = %notification.subject,
            delivered,
            failed,
            "escalation delivered"
        );

        Ok(())
    }

    /// Returns `"email"`.
    fn channel_name(&self) -> &str {
        "email"
    }
}
