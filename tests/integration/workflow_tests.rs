//! Integration tests for the schedule → email → confirm workflow.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use agenda_citas::models::appointment::{AppointmentStatus, AppointmentSubmission};
use agenda_citas::notify::dispatcher::Notifier;
use agenda_citas::AppError;

use super::test_helpers::{
    start_notifier, test_config, test_workflow, valid_submission, wait_for_sent,
    FailingTransport, RecordingTransport,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn submission_for(date: &str) -> AppointmentSubmission {
    AppointmentSubmission {
        name: "Ana Ruiz".into(),
        email: "ana@x.com".into(),
        date: date.into(),
        time: "10:30".into(),
        description: "Consulta de seguimiento".into(),
    }
}

// ─── scheduling ───────────────────────────────────────────────

#[tokio::test]
async fn schedule_stores_pending_and_sends_link() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir.path().join("citas.json"));
    let transport = Arc::new(RecordingTransport::default());
    let ct = CancellationToken::new();
    let notifier = start_notifier(&config, transport.clone(), ct.clone());
    let workflow = test_workflow(&config, notifier);

    let appointment = workflow
        .schedule_appointment_on(submission_for("2030-01-15"), day(2030, 1, 1))
        .await
        .unwrap();

    assert_eq!(appointment.status(), AppointmentStatus::Pending);
    assert_eq!(appointment.requester_name, "Ana Ruiz");
    assert_eq!(appointment.date, day(2030, 1, 15));

    let stored = workflow.list_appointments().await.unwrap();
    assert_eq!(stored, vec![appointment.clone()]);

    let sent = wait_for_sent(&transport, 1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "ana@x.com");
    assert_eq!(sent[0].company_name, "Clínica Sol");
    assert_eq!(
        sent[0].confirm_url,
        format!("http://citas.test/citas/confirmar/{}", appointment.id)
    );

    ct.cancel();
}

#[tokio::test]
async fn schedule_uses_local_today() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir.path().join("citas.json"));
    let workflow = test_workflow(&config, Notifier::disabled());

    assert!(workflow.schedule_appointment(valid_submission(0)).await.is_ok());
    assert!(workflow.schedule_appointment(valid_submission(30)).await.is_ok());
}

#[tokio::test]
async fn rejected_submission_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("citas.json");
    let config = test_config(&path);
    let transport = Arc::new(RecordingTransport::default());
    let ct = CancellationToken::new();
    let notifier = start_notifier(&config, transport.clone(), ct.clone());
    let workflow = test_workflow(&config, notifier);

    let err = workflow
        .schedule_appointment_on(submission_for("2029-12-31"), day(2030, 1, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("pasado")));
    assert!(!path.exists(), "store must not be written");
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(transport.sent.lock().await.is_empty());

    ct.cancel();
}

#[tokio::test]
async fn mail_failure_does_not_fail_scheduling() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir.path().join("citas.json"));
    let ct = CancellationToken::new();
    let notifier = start_notifier(&config, Arc::new(FailingTransport), ct.clone());
    let workflow = test_workflow(&config, notifier);

    let appointment = workflow
        .schedule_appointment_on(submission_for("2030-01-15"), day(2030, 1, 1))
        .await
        .unwrap();

    let stored = workflow.get_appointment(&appointment.id).await.unwrap();
    assert_eq!(stored.status(), AppointmentStatus::Pending);

    ct.cancel();
}

#[tokio::test]
async fn disabled_notifier_still_stores() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir.path().join("citas.json"));
    let workflow = test_workflow(&config, Notifier::disabled());

    workflow
        .schedule_appointment_on(submission_for("2030-01-15"), day(2030, 1, 1))
        .await
        .unwrap();
    assert_eq!(workflow.list_appointments().await.unwrap().len(), 1);
}

// ─── confirmation ─────────────────────────────────────────────

#[tokio::test]
async fn confirm_by_link_flips_status_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir.path().join("citas.json"));
    let workflow = test_workflow(&config, Notifier::disabled());
    let created = workflow
        .schedule_appointment_on(submission_for("2030-01-15"), day(2030, 1, 1))
        .await
        .unwrap();

    let confirmed = workflow.confirm_by_link(&created.id).await.unwrap();
    assert_eq!(confirmed.status(), AppointmentStatus::Confirmed);
    let stamped = confirmed.confirmed_at.expect("confirmation time");

    let again = workflow.confirm_by_link(&created.id).await.unwrap();
    assert_eq!(again.confirmed_at, Some(stamped));
    assert_eq!(again.created_at, created.created_at);
}

#[tokio::test]
async fn confirm_unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir.path().join("citas.json"));
    let workflow = test_workflow(&config, Notifier::disabled());

    let err = workflow.confirm_by_link("no-such-id").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn confirm_only_touches_target_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir.path().join("citas.json"));
    let workflow = test_workflow(&config, Notifier::disabled());
    let first = workflow
        .schedule_appointment_on(submission_for("2030-01-15"), day(2030, 1, 1))
        .await
        .unwrap();
    let second = workflow
        .schedule_appointment_on(submission_for("2030-01-16"), day(2030, 1, 1))
        .await
        .unwrap();

    workflow.confirm_by_link(&second.id).await.unwrap();

    let all = workflow.list_appointments().await.unwrap();
    assert_eq!(all[0].id, first.id);
    assert!(!all[0].confirmed);
    assert!(all[1].confirmed);
}

// ─── admin operations ─────────────────────────────────────────

#[tokio::test]
async fn delete_removes_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir.path().join("citas.json"));
    let workflow = test_workflow(&config, Notifier::disabled());
    let created = workflow
        .schedule_appointment_on(submission_for("2030-01-15"), day(2030, 1, 1))
        .await
        .unwrap();

    assert!(workflow.delete_appointment(&created.id).await.unwrap());
    assert!(matches!(
        workflow.get_appointment(&created.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn corrupt_store_lists_empty_then_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("citas.json");
    std::fs::write(&path, "not json at all").unwrap();
    let config = test_config(&path);
    let workflow = test_workflow(&config, Notifier::disabled());

    assert!(workflow.list_appointments().await.unwrap().is_empty());

    workflow
        .schedule_appointment_on(submission_for("2030-01-15"), day(2030, 1, 1))
        .await
        .unwrap();
    assert_eq!(workflow.list_appointments().await.unwrap().len(), 1);
}
