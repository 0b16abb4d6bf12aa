//! Integration tests for the HTTP server over a real socket.
//!
//! Binds an ephemeral port so tests never collide with a running instance.

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use agenda_citas::web::server::serve_on;

use super::test_helpers::{test_app_state, test_config};

/// Spawn the server on an ephemeral port, returning its base URL.
///
/// Caller must cancel `ct` to shut the server down.
async fn spawn_server(dir: &tempfile::TempDir) -> (String, CancellationToken) {
    let state = test_app_state(test_config(&dir.path().join("citas.json")));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");

    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    tokio::spawn(async move {
        let _ = serve_on(listener, state, server_ct).await;
    });

    (format!("http://{addr}"), ct)
}

// ── GET /health returns 200 OK ───────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let dir = tempfile::tempdir().unwrap();
    let (base_url, ct) = spawn_server(&dir).await;

    let resp = reqwest::get(format!("{base_url}/health"))
        .await
        .expect("HTTP GET /health");

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "ok");

    ct.cancel();
}

// ── Non-existent route returns 404 ──────────────────────────

#[tokio::test]
async fn non_existent_route_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let (base_url, ct) = spawn_server(&dir).await;

    let resp = reqwest::get(format!("{base_url}/nonexistent"))
        .await
        .expect("HTTP GET /nonexistent");

    assert_eq!(resp.status(), 404);
    ct.cancel();
}

// ── Full booking round trip over the wire ───────────────────

#[tokio::test]
async fn booking_round_trip_over_socket() {
    let dir = tempfile::tempdir().unwrap();
    let (base_url, ct) = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("{base_url}/citas/agendar"))
        .json(&super::test_helpers::valid_submission(1))
        .send()
        .await
        .expect("POST /citas/agendar")
        .json()
        .await
        .expect("json body");
    let id = created["id"].as_str().expect("id");

    let confirm = client
        .get(format!("{base_url}/citas/confirmar/{id}"))
        .send()
        .await
        .expect("GET confirm");
    assert_eq!(confirm.status(), 200);

    let listed: serde_json::Value = client
        .get(format!("{base_url}/citas"))
        .send()
        .await
        .expect("GET /citas")
        .json()
        .await
        .expect("json body");
    assert_eq!(listed[0]["confirmada"], true);

    ct.cancel();
}

// ── Cancellation stops the server ───────────────────────────

#[tokio::test]
async fn cancellation_shuts_down_server() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_app_state(test_config(&dir.path().join("citas.json")));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let ct = CancellationToken::new();

    let handle = tokio::spawn(serve_on(listener, state, ct.clone()));
    ct.cancel();

    let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("server stopped")
        .expect("task joined");
    assert!(result.is_ok());
}
