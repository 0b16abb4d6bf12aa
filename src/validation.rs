//! Boundary validation for appointment submissions.

use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;

use crate::config::{SchedulingConfig, ValidationConfig};
use crate::models::appointment::{AppointmentSubmission, NewAppointment};
use crate::AppError;

#[allow(clippy::expect_used)]
static TIME_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}$").expect("time regex is valid"));

/// A rule the submission failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Name shorter or longer than the configured bounds.
    NameLength {
        /// Minimum accepted length.
        min: usize,
        /// Maximum accepted length.
        max: usize,
    },
    /// Email lacks `@` or `.`.
    InvalidEmail,
    /// Date is not `YYYY-MM-DD`.
    InvalidDate(String),
    /// Date is before today.
    PastDate,
    /// Date is before `today + min_lead_days`.
    InsufficientLeadTime {
        /// Earliest date that would be accepted.
        earliest: NaiveDate,
    },
    /// Time is not `HH:MM`.
    InvalidTime(String),
    /// Description shorter or longer than the configured bounds.
    DescriptionLength {
        /// Minimum accepted length.
        min: usize,
        /// Maximum accepted length.
        max: usize,
    },
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameLength { min, max } => {
                write!(f, "el nombre debe tener entre {min} y {max} caracteres")
            }
            Self::InvalidEmail => write!(f, "email inválido"),
            Self::InvalidDate(raw) => {
                write!(f, "formato de fecha inválido (se espera AAAA-MM-DD): {raw}")
            }
            Self::PastDate => write!(f, "la fecha de la cita no puede ser en el pasado"),
            Self::InsufficientLeadTime { earliest } => {
                write!(f, "la fecha de la cita debe ser a partir del {earliest}")
            }
            Self::InvalidTime(raw) => {
                write!(f, "formato de hora inválido (se espera HH:MM): {raw}")
            }
            Self::DescriptionLength { min, max } => {
                write!(f, "la descripción debe tener entre {min} y {max} caracteres")
            }
        }
    }
}

impl std::error::Error for Violation {}

impl From<Violation> for AppError {
    fn from(violation: Violation) -> Self {
        Self::Validation(violation.to_string())
    }
}

/// Field bounds and date rules applied to every submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    bounds: ValidationConfig,
    min_lead_days: u32,
}

impl ValidationRules {
    /// Build rules from the validation and scheduling config sections.
    #[must_use]
    pub fn new(bounds: ValidationConfig, scheduling: &SchedulingConfig) -> Self {
        Self {
            bounds,
            min_lead_days: scheduling.min_lead_days,
        }
    }

    /// Check `submission` against every rule, relative to `today`.
    ///
    /// Rules run in field order and the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the first [`Violation`] encountered.
    pub fn validate(
        &self,
        submission: &AppointmentSubmission,
        today: NaiveDate,
    ) -> Result<NewAppointment, Violation> {
        let name = submission.name.trim();
        if !within(name, self.bounds.name_min_chars, self.bounds.name_max_chars) {
            return Err(Violation::NameLength {
                min: self.bounds.name_min_chars,
                max: self.bounds.name_max_chars,
            });
        }

        let email = submission.email.trim();
        if !email.contains('@') || !email.contains('.') {
            return Err(Violation::InvalidEmail);
        }

        let date = NaiveDate::parse_from_str(submission.date.trim(), "%Y-%m-%d")
            .map_err(|_| Violation::InvalidDate(submission.date.clone()))?;
        if date < today {
            return Err(Violation::PastDate);
        }
        let earliest = today
            .checked_add_days(Days::new(u64::from(self.min_lead_days)))
            .unwrap_or(NaiveDate::MAX);
        if date < earliest {
            return Err(Violation::InsufficientLeadTime { earliest });
        }

        let time = submission.time.trim();
        if !TIME_FORMAT.is_match(time) {
            return Err(Violation::InvalidTime(submission.time.clone()));
        }

        let description = submission.description.trim();
        if !within(
            description,
            self.bounds.description_min_chars,
            self.bounds.description_max_chars,
        ) {
            return Err(Violation::DescriptionLength {
                min: self.bounds.description_min_chars,
                max: self.bounds.description_max_chars,
            });
        }

        Ok(NewAppointment {
            requester_name: name.to_owned(),
            requester_email: email.to_owned(),
            date,
            time: time.to_owned(),
            description: description.to_owned(),
        })
    }
}

fn within(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}
