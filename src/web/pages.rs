//! Server-rendered HTML pages.

use minijinja::context;

use crate::config::GlobalConfig;
use crate::models::appointment::Appointment;
use crate::templates::{self, CONFIRMED, CONFIRM_FAILED, INDEX, NOT_FOUND};
use crate::Result;

/// Listing page; data is fetched client-side from `GET /citas`.
pub const LISTING_PAGE: &str = include_str!("../../static/citas.html");

/// Booking form with company name and business hours filled in.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn index(config: &GlobalConfig) -> Result<String> {
    templates::render(
        INDEX,
        context! {
            company => &config.company.name,
            phone => &config.company.phone,
            opening => &config.scheduling.opening_time,
            closing => &config.scheduling.closing_time,
        },
    )
}

/// Page shown after a confirmation link is visited.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn confirmation_success(appointment: &Appointment) -> Result<String> {
    templates::render(CONFIRMED, context! { cita => appointment })
}

/// Page shown when a confirmation link names an unknown appointment.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn confirmation_not_found() -> Result<String> {
    templates::render(NOT_FOUND, context! {})
}

/// Page shown when confirmation fails for any other reason.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn confirmation_failed() -> Result<String> {
    templates::render(CONFIRM_FAILED, context! {})
}
