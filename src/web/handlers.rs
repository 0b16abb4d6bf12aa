//! Axum request handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use tracing::{error, info, warn};

use super::{pages, AppState};
use crate::models::appointment::{Appointment, AppointmentSubmission};
use crate::{AppError, Result};

/// Handler for `GET /`: booking form.
///
/// # Errors
///
/// 500 if the page fails to render.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    Ok(Html(pages::index(&state.config)?))
}

/// Handler for `GET /citas/ver`: listing page.
pub async fn listing_page() -> Html<&'static str> {
    Html(pages::LISTING_PAGE)
}

/// Handler for `GET /health`: liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// Handler for `POST /citas/agendar`: create a pending appointment and mail the link.
///
/// # Errors
///
/// 400 for a malformed body or a rule violation, 500 if storage fails.
pub async fn schedule(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<AppointmentSubmission>, JsonRejection>,
) -> Result<Json<Appointment>> {
    let Json(submission) = payload.map_err(|rejection| {
        warn!(%rejection, "malformed appointment submission");
        AppError::Validation(format!("formato de datos inválido: {}", rejection.body_text()))
    })?;

    let appointment = state.workflow.schedule_appointment(submission).await?;
    info!(appointment_id = %appointment.id, date = %appointment.date, "appointment scheduled");
    Ok(Json(appointment))
}

/// Handler for `GET /citas`: every appointment as JSON.
///
/// # Errors
///
/// 500 if the store cannot be read.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Appointment>>> {
    Ok(Json(state.workflow.list_appointments().await?))
}

/// Handler for `GET /citas/confirmar/{id}`: confirm through the emailed link.
pub async fn confirm(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let (status, page) = match state.workflow.confirm_by_link(&id).await {
        Ok(appointment) => (StatusCode::OK, pages::confirmation_success(&appointment)),
        Err(AppError::NotFound(_)) => {
            info!(appointment_id = %id, "confirmation link for unknown appointment");
            (StatusCode::NOT_FOUND, pages::confirmation_not_found())
        }
        Err(err) => {
            error!(appointment_id = %id, %err, "confirmation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, pages::confirmation_failed())
        }
    };

    match page {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => err.into_response(),
    }
}
