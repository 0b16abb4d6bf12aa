//! Confirmation email composition and delivery.
//!
//! The workflow hands a [`ConfirmationEmail`] to a [`dispatcher::Notifier`],
//! which queues it for a background worker. The worker delivers through a
//! [`MailTransport`], retrying transient failures, so a slow or broken mail
//! server never holds up appointment creation.

pub mod compose;
pub mod dispatcher;
pub mod smtp;

use std::future::Future;
use std::pin::Pin;

use crate::models::appointment::Appointment;
use crate::Result;

/// Everything needed to tell a requester how to confirm their appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationEmail {
    /// Recipient address.
    pub recipient: String,
    /// Requester name used in the greeting.
    pub requester_name: String,
    /// Appointment date, `YYYY-MM-DD`.
    pub date: String,
    /// Appointment time, `HH:MM`.
    pub time: String,
    /// Appointment description.
    pub description: String,
    /// Company display name.
    pub company_name: String,
    /// Link that confirms the appointment when visited.
    pub confirm_url: String,
}

impl ConfirmationEmail {
    /// Build the email for a freshly created appointment.
    #[must_use]
    pub fn for_appointment(
        appointment: &Appointment,
        company_name: impl Into<String>,
        confirm_url: impl Into<String>,
    ) -> Self {
        Self {
            recipient: appointment.requester_email.clone(),
            requester_name: appointment.requester_name.clone(),
            date: appointment.date.format("%Y-%m-%d").to_string(),
            time: appointment.time.clone(),
            description: appointment.description.clone(),
            company_name: company_name.into(),
            confirm_url: confirm_url.into(),
        }
    }
}

/// Outbound mail transport.
pub trait MailTransport: Send + Sync {
    /// Compose and transmit `email`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Undeliverable` if the message can never be sent
    /// as composed, or `AppError::Mail` for failures worth retrying.
    fn send<'a>(
        &'a self,
        email: &'a ConfirmationEmail,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
