//! Persistence layer modules.
//!
//! [`AppointmentStore`] is the only way the rest of the application touches
//! durable state. Two backends implement it: [`json_store::JsonFileStore`]
//! (a single JSON array on disk) and [`sqlite_store::SqliteStore`].

pub mod db;
pub mod json_store;
pub mod schema;
pub mod sqlite_store;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::models::appointment::{Appointment, NewAppointment};
use crate::Result;

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Record store for appointments.
///
/// Every operation observes the latest durable state; implementations keep
/// no cache between calls.
pub trait AppointmentStore: Send + Sync {
    /// Persist a new pending appointment and return it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the record cannot be written.
    fn create(&self, new: NewAppointment) -> StoreFuture<'_, Appointment>;

    /// All appointments in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the backend cannot be queried.
    fn list(&self) -> StoreFuture<'_, Vec<Appointment>>;

    /// Retrieve one appointment by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no appointment has `id`.
    fn get_by_id<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Appointment>;

    /// Mark an appointment confirmed.
    ///
    /// The first call stamps `confirmed_at`; later calls return the record
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no appointment has `id`, or
    /// `AppError::Db` if the update cannot be written.
    fn confirm<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Appointment>;

    /// Remove an appointment. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the removal cannot be written.
    fn delete<'a>(&'a self, id: &'a str) -> StoreFuture<'a, bool>;
}

/// Open the store selected by `config`.
///
/// # Errors
///
/// Returns `AppError::Db` if the `SQLite` database cannot be opened.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn AppointmentStore>> {
    match config.backend {
        StorageBackend::Json => {
            info!(path = %config.path.display(), "using json file store");
            Ok(Arc::new(json_store::JsonFileStore::new(config.path.clone())))
        }
        StorageBackend::Sqlite => {
            info!(path = %config.path.display(), "using sqlite store");
            let pool = db::connect(&config.path).await?;
            Ok(Arc::new(sqlite_store::SqliteStore::new(Arc::new(pool))))
        }
    }
}
