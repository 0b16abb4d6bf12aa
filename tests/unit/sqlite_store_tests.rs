//! Unit tests for the `SQLite` record store.

use std::sync::Arc;

use chrono::NaiveDate;

use agenda_citas::config::{StorageBackend, StorageConfig};
use agenda_citas::models::appointment::NewAppointment;
use agenda_citas::persistence::sqlite_store::SqliteStore;
use agenda_citas::persistence::{db, open_store, AppointmentStore};
use agenda_citas::AppError;

fn new_appointment(name: &str) -> NewAppointment {
    NewAppointment {
        requester_name: name.into(),
        requester_email: "ana@x.com".into(),
        date: NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(),
        time: "10:00".into(),
        description: "Consulta de prueba".into(),
    }
}

async fn memory_store() -> SqliteStore {
    let pool = db::connect_memory().await.expect("in-memory db");
    SqliteStore::new(Arc::new(pool))
}

#[tokio::test]
async fn create_and_get_round_trip() {
    let store = memory_store().await;
    let created = store.create(new_appointment("Ana Ruiz")).await.unwrap();

    let found = store.get_by_id(&created.id).await.unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.requester_name, "Ana Ruiz");
    assert_eq!(found.date, created.date);
    assert_eq!(found.created_at, created.created_at);
    assert!(!found.confirmed);
}

#[tokio::test]
async fn list_is_in_insertion_order() {
    let store = memory_store().await;
    let names = ["Primera", "Segunda", "Tercera"];
    for name in names {
        store.create(new_appointment(name)).await.unwrap();
    }

    let listed: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.requester_name)
        .collect();
    assert_eq!(listed, names);
}

#[tokio::test]
async fn confirm_is_idempotent() {
    let store = memory_store().await;
    let created = store.create(new_appointment("Ana Ruiz")).await.unwrap();

    let first = store.confirm(&created.id).await.unwrap();
    assert!(first.confirmed);
    assert!(first.confirmed_at.is_some());

    let second = store.confirm(&created.id).await.unwrap();
    assert_eq!(second.confirmed_at, first.confirmed_at);
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let store = memory_store().await;

    assert!(matches!(
        store.get_by_id("missing").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        store.confirm("missing").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_reports_removal() {
    let store = memory_store().await;
    let created = store.create(new_appointment("Ana Ruiz")).await.unwrap();

    assert!(store.delete(&created.id).await.unwrap());
    assert!(!store.delete(&created.id).await.unwrap());
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn open_store_selects_sqlite_backend() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        backend: StorageBackend::Sqlite,
        path: dir.path().join("data/citas.db"),
    };

    let store = open_store(&config).await.unwrap();
    let created = store.create(new_appointment("Ana Ruiz")).await.unwrap();
    assert!(config.path.exists());
    assert_eq!(store.list().await.unwrap()[0].id, created.id);
}
