//! HTTP surface: router, handlers, and server-rendered pages.

pub mod error;
pub mod handlers;
pub mod pages;
pub mod server;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::config::GlobalConfig;
use crate::workflow::ConfirmationWorkflow;

/// Shared state handed to every handler.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// Appointment workflow.
    pub workflow: ConfirmationWorkflow,
}

/// Build the application router.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/citas", get(handlers::list))
        .route("/citas/ver", get(handlers::listing_page))
        .route("/citas/agendar", post(handlers::schedule))
        .route("/citas/confirmar/{id}", get(handlers::confirm))
        .with_state(state)
}
