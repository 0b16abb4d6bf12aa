//! Appointment store for `SQLite` persistence.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::db::Database;
use super::{AppointmentStore, StoreFuture};
use crate::models::appointment::{Appointment, NewAppointment};
use crate::models::timestamp;
use crate::{AppError, Result};

const SELECT_BY_ID: &str = "SELECT id, requester_name, requester_email, date, time,
     description, created_at, confirmed, confirmed_at
     FROM appointment WHERE id = ?1";

const SELECT_ALL: &str = "SELECT id, requester_name, requester_email, date, time,
     description, created_at, confirmed, confirmed_at
     FROM appointment ORDER BY seq ASC";

/// Repository for appointment records.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct AppointmentRow {
    id: String,
    requester_name: String,
    requester_email: String,
    date: String,
    time: String,
    description: String,
    created_at: String,
    confirmed: i64,
    confirmed_at: Option<String>,
}

impl AppointmentRow {
    fn into_appointment(self) -> Result<Appointment> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| AppError::Db(format!("invalid date: {e}")))?;
        let created_at = timestamp::parse(&self.created_at)
            .ok_or_else(|| AppError::Db(format!("invalid created_at: {}", self.created_at)))?;
        let confirmed_at = self
            .confirmed_at
            .map(|raw| {
                timestamp::parse(&raw)
                    .ok_or_else(|| AppError::Db(format!("invalid confirmed_at: {raw}")))
            })
            .transpose()?;

        Ok(Appointment {
            id: self.id,
            requester_name: self.requester_name,
            requester_email: self.requester_email,
            date,
            time: self.time,
            description: self.description,
            created_at,
            confirmed: self.confirmed != 0,
            confirmed_at,
        }
        .normalized())
    }
}

impl SqliteStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: &str) -> Result<Option<Appointment>> {
        let row: Option<AppointmentRow> = sqlx::query_as(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;
        row.map(AppointmentRow::into_appointment).transpose()
    }
}

impl AppointmentStore for SqliteStore {
    fn create(&self, new: NewAppointment) -> StoreFuture<'_, Appointment> {
        Box::pin(async move {
            let appointment = Appointment::new(new);

            sqlx::query(
                "INSERT INTO appointment (id, requester_name, requester_email, date, time,
                     description, created_at, confirmed, confirmed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, NULL)",
            )
            .bind(&appointment.id)
            .bind(&appointment.requester_name)
            .bind(&appointment.requester_email)
            .bind(appointment.date.format("%Y-%m-%d").to_string())
            .bind(&appointment.time)
            .bind(&appointment.description)
            .bind(timestamp::format(&appointment.created_at))
            .execute(self.db.as_ref())
            .await?;

            info!(appointment_id = %appointment.id, "appointment created");
            Ok(appointment)
        })
    }

    fn list(&self) -> StoreFuture<'_, Vec<Appointment>> {
        Box::pin(async move {
            let rows: Vec<AppointmentRow> = sqlx::query_as(SELECT_ALL)
                .fetch_all(self.db.as_ref())
                .await?;
            rows.into_iter().map(AppointmentRow::into_appointment).collect()
        })
    }

    fn get_by_id<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Appointment> {
        Box::pin(async move {
            self.fetch(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("appointment {id} not found")))
        })
    }

    fn confirm<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Appointment> {
        Box::pin(async move {
            let now = timestamp::format(&timestamp::now());
            let mut tx = self.db.begin().await?;

            // Only the first confirmation matches `confirmed = 0`.
            let updated = sqlx::query(
                "UPDATE appointment SET confirmed = 1, confirmed_at = ?1
                 WHERE id = ?2 AND confirmed = 0",
            )
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            let row: Option<AppointmentRow> = sqlx::query_as(SELECT_BY_ID)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.commit().await?;

            let appointment = row
                .ok_or_else(|| AppError::NotFound(format!("appointment {id} not found")))?
                .into_appointment()?;

            if updated == 0 {
                debug!(appointment_id = id, "appointment already confirmed");
            } else {
                info!(appointment_id = id, "appointment confirmed");
            }
            Ok(appointment)
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let removed = sqlx::query("DELETE FROM appointment WHERE id = ?1")
                .bind(id)
                .execute(self.db.as_ref())
                .await?
                .rows_affected();
            if removed > 0 {
                info!(appointment_id = id, "appointment deleted");
            }
            Ok(removed > 0)
        })
    }
}
