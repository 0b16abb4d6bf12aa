//! Unit tests for the JSON file record store.

use std::sync::Arc;

use chrono::NaiveDate;

use agenda_citas::models::appointment::{Appointment, NewAppointment};
use agenda_citas::persistence::json_store::JsonFileStore;
use agenda_citas::persistence::AppointmentStore;
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

fn store_in(dir: &tempfile::TempDir) -> JsonFileStore {
    JsonFileStore::new(dir.path().join("citas.json"))
}

// ─── load / save ──────────────────────────────────────────────

#[tokio::test]
async fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    assert!(store.load().await.is_empty());
    assert!(!store.path().exists(), "load must not create the file");
}

#[tokio::test]
async fn malformed_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), "{ not json").unwrap();

    assert!(store.load().await.is_empty());
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn save_then_load_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let records = vec![
        Appointment::new(new_appointment("Primera")),
        Appointment::new(new_appointment("Segunda")),
    ];

    store.save(&records).await.unwrap();
    assert_eq!(store.load().await, records);
}

#[tokio::test]
async fn saved_file_is_pretty_printed_array() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store
        .save(&[Appointment::new(new_appointment("Ana Ruiz"))])
        .await
        .unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(raw.starts_with('['));
    assert!(raw.contains('\n'), "expected indented output");
    assert!(raw.contains("\"nombre\": \"Ana Ruiz\""));
}

#[tokio::test]
async fn saved_file_keeps_non_ascii_literal_with_two_space_indent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let mut new = new_appointment("José Núñez");
    new.description = "Revisión de la ortodoncia".into();
    store.create(new).await.unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\"nombre\": \"José Núñez\""), "raw: {raw}");
    assert!(raw.contains("\"descripcion\": \"Revisión de la ortodoncia\""));
    assert!(!raw.contains("\\u00"), "non-ASCII must not be escaped");
    assert!(raw.starts_with("[\n  {\n    \"id\": "), "raw: {raw}");
}

#[tokio::test]
async fn save_creates_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("nested/data/citas.json"));

    store.save(&[]).await.unwrap();
    assert!(store.path().exists());
}

#[tokio::test]
async fn unwritable_location_surfaces_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file, not a directory").unwrap();
    let store = JsonFileStore::new(blocker.join("citas.json"));

    let err = store
        .create(new_appointment("Ana Ruiz"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Io(_)));
}

// ─── store operations ─────────────────────────────────────────

#[tokio::test]
async fn create_appends_pending_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let first = store.create(new_appointment("Primera")).await.unwrap();
    let second = store.create(new_appointment("Segunda")).await.unwrap();

    let all = store.list().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, first.id);
    assert_eq!(all[1].id, second.id);
    assert!(all.iter().all(|a| !a.confirmed && a.confirmed_at.is_none()));
}

#[tokio::test]
async fn get_by_id_finds_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let created = store.create(new_appointment("Ana Ruiz")).await.unwrap();

    let found = store.get_by_id(&created.id).await.unwrap();
    assert_eq!(found, created);
}

#[tokio::test]
async fn get_by_unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let err = store.get_by_id("missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn confirm_sets_flag_and_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let created = store.create(new_appointment("Ana Ruiz")).await.unwrap();

    let confirmed = store.confirm(&created.id).await.unwrap();
    assert!(confirmed.confirmed);
    assert!(confirmed.confirmed_at.is_some());

    let reloaded = store.get_by_id(&created.id).await.unwrap();
    assert_eq!(reloaded, confirmed);
}

#[tokio::test]
async fn confirm_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let created = store.create(new_appointment("Ana Ruiz")).await.unwrap();

    let first = store.confirm(&created.id).await.unwrap();
    let second = store.confirm(&created.id).await.unwrap();
    assert_eq!(first.confirmed_at, second.confirmed_at);
}

#[tokio::test]
async fn confirm_unknown_id_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.create(new_appointment("Ana Ruiz")).await.unwrap();
    let before = std::fs::read(store.path()).unwrap();

    let err = store.confirm("missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
}

#[tokio::test]
async fn delete_removes_only_target() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let keep = store.create(new_appointment("Mantener")).await.unwrap();
    let drop = store.create(new_appointment("Borrar")).await.unwrap();

    assert!(store.delete(&drop.id).await.unwrap());
    assert!(!store.delete(&drop.id).await.unwrap());

    let all = store.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, keep.id);
}

#[tokio::test]
async fn concurrent_creates_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(store_in(&dir));

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .create(new_appointment(&format!("Cliente {i}")))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.list().await.unwrap().len(), 16);
}

#[tokio::test]
async fn orphan_confirmation_time_is_dropped_on_read() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(
        store.path(),
        r#"[{
            "id": "x1",
            "nombre": "Ana Ruiz",
            "email": "ana@x.com",
            "fecha": "2030-01-15",
            "hora": "10:00",
            "descripcion": "Consulta de prueba",
            "creada_en": "2030-01-01T10:00:00Z",
            "confirmada": false,
            "confirmada_en": "2030-01-02T10:00:00Z"
        }]"#,
    )
    .unwrap();

    let record = store.get_by_id("x1").await.unwrap();
    assert!(record.confirmed_at.is_none());
}
