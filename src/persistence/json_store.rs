//! Appointment store backed by a single JSON file.
//!
//! The file holds one pretty-printed JSON array with every record. Each
//! mutation re-reads the whole file, applies the change, and rewrites the
//! whole file through a temporary file that is renamed over the target, so
//! readers never observe a partial write.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{AppointmentStore, StoreFuture};
use crate::models::appointment::{Appointment, NewAppointment};
use crate::models::timestamp;
use crate::{AppError, Result};

/// JSON file record store.
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store over `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole collection.
    ///
    /// A missing file or unparsable content yields an empty collection; the
    /// failure is logged and never returned.
    pub async fn load(&self) -> Vec<Appointment> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file absent; treating as empty");
                return Vec::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "failed to read store file; treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<Appointment>>(&bytes) {
            Ok(records) => records.into_iter().map(Appointment::normalized).collect(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "store file is malformed; treating as empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the whole collection with `records`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if serialization fails or `AppError::Io` if
    /// the file cannot be written.
    pub async fn save(&self, records: &[Appointment]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_records(records).await
    }

    async fn write_records(&self, records: &[Appointment]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|err| AppError::Io(format!("store write task panicked: {err}")))?
    }
}

/// Write `bytes` to a temp file next to `path`, then rename it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|err| {
        AppError::Io(format!(
            "failed to create store directory {}: {err}",
            parent.display()
        ))
    })?;

    let mut tmp = NamedTempFile::new_in(&parent)
        .map_err(|err| AppError::Io(format!("failed to create temporary file: {err}")))?;
    tmp.write_all(bytes)
        .map_err(|err| AppError::Io(format!("failed to write temporary file: {err}")))?;
    tmp.persist(path).map_err(|err| {
        AppError::Io(format!(
            "failed to persist store file {}: {err}",
            path.display()
        ))
    })?;
    Ok(())
}

impl AppointmentStore for JsonFileStore {
    fn create(&self, new: NewAppointment) -> StoreFuture<'_, Appointment> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut records = self.load().await;

            let mut appointment = Appointment::new(new);
            while records.iter().any(|r| r.id == appointment.id) {
                appointment.id = uuid::Uuid::new_v4().to_string();
            }

            records.push(appointment.clone());
            self.write_records(&records).await?;
            info!(appointment_id = %appointment.id, total = records.len(), "appointment created");
            Ok(appointment)
        })
    }

    fn list(&self) -> StoreFuture<'_, Vec<Appointment>> {
        Box::pin(async move { Ok(self.load().await) })
    }

    fn get_by_id<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Appointment> {
        Box::pin(async move {
            self.load()
                .await
                .into_iter()
                .find(|r| r.id == id)
                .ok_or_else(|| AppError::NotFound(format!("appointment {id} not found")))
        })
    }

    fn confirm<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Appointment> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut records = self.load().await;

            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| AppError::NotFound(format!("appointment {id} not found")))?;

            if !record.confirm(timestamp::now()) {
                debug!(appointment_id = id, "appointment already confirmed");
                return Ok(record.clone());
            }

            let confirmed = record.clone();
            self.write_records(&records).await?;
            info!(appointment_id = id, "appointment confirmed");
            Ok(confirmed)
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut records = self.load().await;
            let before = records.len();
            records.retain(|r| r.id != id);

            if records.len() == before {
                return Ok(false);
            }

            self.write_records(&records).await?;
            info!(appointment_id = id, "appointment deleted");
            Ok(true)
        })
    }
}
