//! Confirmation email body builders.
//!
//! Produces the subject plus matching plain-text and HTML bodies. The HTML
//! template escapes every user-supplied value.

use minijinja::{context, Value};

use super::ConfirmationEmail;
use crate::templates::{self, EMAIL_HTML, EMAIL_TEXT};
use crate::Result;

/// Subject and both bodies of a confirmation email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    /// Subject line.
    pub subject: String,
    /// Plain-text alternative.
    pub text: String,
    /// HTML alternative.
    pub html: String,
}

/// Build the subject line.
#[must_use]
pub fn subject(email: &ConfirmationEmail) -> String {
    format!("Confirmación de Cita - {}", email.company_name)
}

fn body_context(email: &ConfirmationEmail) -> Value {
    context! {
        name => &email.requester_name,
        company => &email.company_name,
        date => &email.date,
        time => &email.time,
        description => &email.description,
        url => &email.confirm_url,
    }
}

/// Build the plain-text body.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn text_body(email: &ConfirmationEmail) -> Result<String> {
    templates::render(EMAIL_TEXT, body_context(email))
}

/// Build the HTML body.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn html_body(email: &ConfirmationEmail) -> Result<String> {
    templates::render(EMAIL_HTML, body_context(email))
}

/// Build subject and both bodies.
///
/// # Errors
///
/// Returns `AppError::Template` if either body fails to render.
pub fn compose(email: &ConfirmationEmail) -> Result<ComposedMessage> {
    Ok(ComposedMessage {
        subject: subject(email),
        text: text_body(email)?,
        html: html_body(email)?,
    })
}
