//! Page and email templates rendered with `minijinja`.
//!
//! Templates are compiled into the binary. Names ending in `.html` are
//! auto-escaped; `.txt` templates are rendered verbatim.

use std::sync::LazyLock;

use minijinja::Environment;
use serde::Serialize;

use crate::Result;

/// Booking form.
pub const INDEX: &str = "index.html";
/// Successful confirmation page.
pub const CONFIRMED: &str = "confirmed.html";
/// Unknown confirmation link page.
pub const NOT_FOUND: &str = "not_found.html";
/// Confirmation failure page.
pub const CONFIRM_FAILED: &str = "confirm_failed.html";
/// HTML part of the confirmation email.
pub const EMAIL_HTML: &str = "email.html";
/// Plain-text part of the confirmation email.
pub const EMAIL_TEXT: &str = "email.txt";

const SOURCES: [(&str, &str); 6] = [
    (INDEX, include_str!("../templates/index.html")),
    (CONFIRMED, include_str!("../templates/confirmed.html")),
    (NOT_FOUND, include_str!("../templates/not_found.html")),
    (CONFIRM_FAILED, include_str!("../templates/confirm_failed.html")),
    (EMAIL_HTML, include_str!("../templates/email.html")),
    (EMAIL_TEXT, include_str!("../templates/email.txt")),
];

#[allow(clippy::expect_used)]
static ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    for (name, source) in SOURCES {
        env.add_template(name, source)
            .expect("bundled template should be valid");
    }
    env
});

/// Render the bundled template `name` with `ctx`.
///
/// # Errors
///
/// Returns `AppError::Template` if `name` is unknown or rendering fails.
pub fn render<S: Serialize>(name: &str, ctx: S) -> Result<String> {
    Ok(ENV.get_template(name)?.render(ctx)?)
}
