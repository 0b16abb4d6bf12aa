//! Appointment confirmation workflow.
//!
//! Ties the record store to the notifier: a valid submission is stored as
//! pending and a confirmation link is mailed to the requester; visiting the
//! link later flips the record to confirmed.
//!
//! ```text
//! PENDING --confirm--> CONFIRMED
//! ```

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{info, info_span, warn, Instrument};

use crate::config::GlobalConfig;
use crate::models::appointment::{Appointment, AppointmentSubmission};
use crate::notify::dispatcher::Notifier;
use crate::notify::ConfirmationEmail;
use crate::persistence::AppointmentStore;
use crate::validation::ValidationRules;
use crate::Result;

/// Build the confirmation URL for appointment `id`.
#[must_use]
pub fn confirmation_link(base_url: &str, id: &str) -> String {
    format!("{}/citas/confirmar/{id}", base_url.trim_end_matches('/'))
}

/// Orchestrates create → notify → confirm.
#[derive(Clone)]
pub struct ConfirmationWorkflow {
    store: Arc<dyn AppointmentStore>,
    notifier: Notifier,
    rules: ValidationRules,
    company_name: String,
    base_url: String,
}

impl ConfirmationWorkflow {
    /// Build a workflow over `store`, sending through `notifier`.
    #[must_use]
    pub fn new(store: Arc<dyn AppointmentStore>, notifier: Notifier, config: &GlobalConfig) -> Self {
        Self {
            store,
            notifier,
            rules: ValidationRules::new(config.validation, &config.scheduling),
            company_name: config.company.name.clone(),
            base_url: config.http.base_url.clone(),
        }
    }

    /// Validate, store, and request a confirmation email for `submission`.
    ///
    /// The appointment is returned even if the email cannot be queued.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the submission breaks a rule (the
    /// store is not touched), or `AppError::Db` / `AppError::Io` if the
    /// record cannot be written.
    pub async fn schedule_appointment(
        &self,
        submission: AppointmentSubmission,
    ) -> Result<Appointment> {
        self.schedule_appointment_on(submission, Local::now().date_naive())
            .await
    }

    /// [`Self::schedule_appointment`] with an explicit notion of today.
    ///
    /// # Errors
    ///
    /// Same as [`Self::schedule_appointment`].
    pub async fn schedule_appointment_on(
        &self,
        submission: AppointmentSubmission,
        today: NaiveDate,
    ) -> Result<Appointment> {
        let new = self.rules.validate(&submission, today).map_err(|violation| {
            info!(%violation, "appointment submission rejected");
            violation
        })?;

        let appointment = self
            .store
            .create(new)
            .instrument(info_span!("create_appointment"))
            .await?;

        let link = confirmation_link(&self.base_url, &appointment.id);
        let email = ConfirmationEmail::for_appointment(&appointment, &self.company_name, link);
        if !self.notifier.notify(email) {
            warn!(appointment_id = %appointment.id, "confirmation email not queued");
        }

        Ok(appointment)
    }

    /// Confirm the appointment whose id is embedded in a confirmation link.
    ///
    /// Confirming twice is not an error; the stored record is returned
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id.
    pub async fn confirm_by_link(&self, id: &str) -> Result<Appointment> {
        self.store.confirm(id).await
    }

    /// All appointments in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        self.store.list().await
    }

    /// One appointment by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id.
    pub async fn get_appointment(&self, id: &str) -> Result<Appointment> {
        self.store.get_by_id(id).await
    }

    /// Remove an appointment. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the removal cannot be written.
    pub async fn delete_appointment(&self, id: &str) -> Result<bool> {
        self.store.delete(id).await
    }
}
