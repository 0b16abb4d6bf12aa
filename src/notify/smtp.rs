//! SMTP transport built on `lettre`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::compose::compose;
use super::{ConfirmationEmail, MailTransport};
use crate::config::SmtpCredentials;
use crate::{AppError, Result};

/// STARTTLS SMTP relay client.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer that logs in with `credentials` and sends as
    /// `"{sender_name}" <username>`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the sender address is invalid, or
    /// `AppError::Mail` if the relay cannot be set up.
    pub fn new(credentials: &SmtpCredentials, sender_name: &str, timeout: Duration) -> Result<Self> {
        let address = credentials.username.parse().map_err(|err| {
            AppError::Config(format!("smtp username is not a valid sender address: {err}"))
        })?;
        let sender = Mailbox::new(Some(sender_name.to_owned()), address);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&credentials.host)?
            .port(credentials.port)
            .credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.clone(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self { transport, sender })
    }

    /// Build the MIME message for `email`.
    ///
    /// Failures here are permanent, so they surface as
    /// `AppError::Undeliverable`.
    fn build_message(&self, email: &ConfirmationEmail) -> Result<Message> {
        let composed =
            compose(email).map_err(|err| AppError::Undeliverable(err.to_string()))?;
        let message = Message::builder()
            .from(self.sender.clone())
            .to(email.recipient.parse()?)
            .subject(composed.subject)
            .multipart(MultiPart::alternative_plain_html(composed.text, composed.html))?;
        Ok(message)
    }
}

impl MailTransport for SmtpMailer {
    fn send<'a>(
        &'a self,
        email: &'a ConfirmationEmail,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let message = self.build_message(email)?;
            self.transport.send(message).await?;
            info!(recipient = %email.recipient, "confirmation email sent");
            Ok(())
        })
    }
}
