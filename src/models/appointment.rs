//! Appointment record model and lifecycle helpers.
//!
//! Serialized keys keep the Spanish names used by the data file and the
//! booking UI (`nombre`, `fecha`, `confirmada`, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confirmation state derived from the `confirmed` flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Waiting for the requester to visit the confirmation link.
    Pending,
    /// Confirmation link visited. Terminal.
    Confirmed,
}

/// Raw appointment request as posted by the booking form.
///
/// No invariants hold yet; see [`crate::validation::ValidationRules`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentSubmission {
    /// Requester full name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Requester email address.
    pub email: String,
    /// Requested date, `YYYY-MM-DD`.
    #[serde(rename = "fecha")]
    pub date: String,
    /// Requested time, `HH:MM`.
    #[serde(rename = "hora")]
    pub time: String,
    /// Reason for the appointment.
    #[serde(rename = "descripcion")]
    pub description: String,
}

/// A submission that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    /// Requester full name.
    pub requester_name: String,
    /// Requester email address.
    pub requester_email: String,
    /// Appointment date.
    pub date: NaiveDate,
    /// Appointment time, `HH:MM`.
    pub time: String,
    /// Reason for the appointment.
    pub description: String,
}

/// A persisted appointment request and its confirmation state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    /// Unique record identifier; doubles as the confirmation token.
    pub id: String,
    /// Requester full name.
    #[serde(rename = "nombre")]
    pub requester_name: String,
    /// Requester email address.
    #[serde(rename = "email")]
    pub requester_email: String,
    /// Appointment date.
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    /// Appointment time, `HH:MM`.
    #[serde(rename = "hora")]
    pub time: String,
    /// Reason for the appointment.
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Creation timestamp; immutable.
    #[serde(rename = "creada_en", with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    /// Whether the confirmation link has been visited.
    #[serde(rename = "confirmada", default)]
    pub confirmed: bool,
    /// When the confirmation link was first visited.
    #[serde(rename = "confirmada_en", default, with = "super::timestamp::option")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// Construct a pending appointment with a generated identifier.
    #[must_use]
    pub fn new(new: NewAppointment) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            requester_name: new.requester_name,
            requester_email: new.requester_email,
            date: new.date,
            time: new.time,
            description: new.description,
            created_at: super::timestamp::now(),
            confirmed: false,
            confirmed_at: None,
        }
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> AppointmentStatus {
        if self.confirmed {
            AppointmentStatus::Confirmed
        } else {
            AppointmentStatus::Pending
        }
    }

    /// Mark the appointment confirmed at `now`.
    ///
    /// Returns `true` if this call performed the transition; an already
    /// confirmed appointment is left untouched.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> bool {
        if self.confirmed {
            return false;
        }
        self.confirmed = true;
        self.confirmed_at = Some(now);
        true
    }

    /// Restore the `confirmed_at` / `confirmed` pairing on records read
    /// from storage.
    ///
    /// A confirmed record with no confirmation time gets `created_at`, the
    /// earliest moment it can have been confirmed.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if !self.confirmed {
            self.confirmed_at = None;
        } else if self.confirmed_at.is_none() {
            self.confirmed_at = Some(self.created_at);
        }
        self
    }
}
