//! Worker cycles against a live backend listening on a loopback port.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use examhall_agent::client::BackendClient;
use examhall_agent::ledger::{NextStep, TaskProgress};
use examhall_agent::worker::{CycleSummary, Worker};
use examhall_api::auth::jwt::JwtConfig;
use examhall_api::config::ServerConfig;
use examhall_api::router::build_app_router;
use examhall_api::state::AppState;
use examhall_api::storage::{LocalObjectStore, ObjectStore};
use examhall_db::models::task::CreateTask;
use examhall_db::{FleetStore, MemoryStore};
use tempfile::TempDir;

const DEVICE_IP: &str = "10.0.0.7";

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> BackendClient {
    BackendClient::new(&format!("http://{addr}"), DEVICE_IP, Duration::from_secs(5)).unwrap()
}

struct Backend {
    addr: SocketAddr,
    store: Arc<MemoryStore>,
    objects: LocalObjectStore,
    _storage: TempDir,
}

/// The real API router over an in-memory store.
async fn start_backend() -> Backend {
    let storage = tempfile::tempdir().unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: addr.port(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        storage_dir: storage.path().to_path_buf(),
        public_base_url: base_url.clone(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            issuer: None,
            access_token_expiry_mins: 60,
        },
    };
    let store = Arc::new(MemoryStore::new());
    let objects = LocalObjectStore::new(storage.path().to_path_buf(), &base_url);

    let state = AppState {
        store: store.clone(),
        objects: Arc::new(objects.clone()),
        config: Arc::new(config.clone()),
    };
    let router = build_app_router(state, &config);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Backend {
        addr,
        store,
        objects,
        _storage: storage,
    }
}

#[tokio::test]
async fn cycle_downloads_exam_file_and_reports_completion() {
    let backend = start_backend().await;
    let key = "owner/1700000000000_exam.xlsx";
    backend.objects.put(key, b"exam-bytes").await.unwrap();

    let task = backend
        .store
        .create_task(&CreateTask {
            device_ip: DEVICE_IP.to_string(),
            task_type: "upload_file".to_string(),
            file_url: Some(backend.objects.public_url(key)),
            file_name: Some("2026-10-19_09-00-00_11-00-00_exam.xlsx".to_string()),
            payload: serde_json::json!({}),
        })
        .await
        .unwrap();

    let downloads = tempfile::tempdir().unwrap();
    let mut worker = Worker::new(client(backend.addr), downloads.path());

    let summary = worker.run_cycle().await.unwrap();
    assert_eq!(
        summary,
        CycleSummary {
            delivered: 1,
            reported: 1,
            skipped: 0
        }
    );

    let path = downloads
        .path()
        .join("2026-10-19_09-00-00_11-00-00_exam.xlsx");
    assert_eq!(std::fs::read(&path).unwrap(), b"exam-bytes");

    let stored = backend.store.task(task.id).await.unwrap();
    assert_eq!(stored.status, "completed");
    assert!(stored.completed_at.is_some());
    assert_eq!(
        stored.payload,
        Some(serde_json::json!({ "result": { "path": path.display().to_string() } }))
    );

    let heartbeat = backend.store.find_heartbeat(DEVICE_IP).await.unwrap();
    assert_eq!(heartbeat.unwrap().status, "online");

    // Completed tasks are no longer delivered.
    let summary = worker.run_cycle().await.unwrap();
    assert_eq!(summary, CycleSummary::default());
}

#[tokio::test]
async fn unsupported_task_type_is_reported_failed() {
    let backend = start_backend().await;
    let task = backend
        .store
        .create_task(&CreateTask {
            device_ip: DEVICE_IP.to_string(),
            task_type: "reboot".to_string(),
            file_url: None,
            file_name: None,
            payload: serde_json::json!({}),
        })
        .await
        .unwrap();

    let downloads = tempfile::tempdir().unwrap();
    let mut worker = Worker::new(client(backend.addr), downloads.path());
    let summary = worker.run_cycle().await.unwrap();
    assert_eq!(summary.reported, 1);

    let stored = backend.store.task(task.id).await.unwrap();
    assert_eq!(stored.status, "failed");
    let reason = stored.payload.unwrap()["result"].as_str().unwrap().to_string();
    assert!(reason.contains("reboot"), "unexpected reason: {reason}");
    assert_eq!(
        worker.ledger().progress(task.id),
        Some(&TaskProgress::Reported {
            status: "failed".to_string()
        })
    );
}

#[tokio::test]
async fn missing_file_reports_failure() {
    let backend = start_backend().await;
    let task = backend
        .store
        .create_task(&CreateTask {
            device_ip: DEVICE_IP.to_string(),
            task_type: "upload_file".to_string(),
            file_url: Some(backend.objects.public_url("owner/gone.xlsx")),
            file_name: Some("gone.xlsx".to_string()),
            payload: serde_json::json!({}),
        })
        .await
        .unwrap();

    let downloads = tempfile::tempdir().unwrap();
    let mut worker = Worker::new(client(backend.addr), downloads.path());
    worker.run_cycle().await.unwrap();

    let stored = backend.store.task(task.id).await.unwrap();
    assert_eq!(stored.status, "failed");
    assert!(!downloads.path().join("gone.xlsx").exists());
}

#[tokio::test]
async fn unreachable_backend_fails_the_cycle() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let downloads = tempfile::tempdir().unwrap();
    let mut worker = Worker::new(client(addr), downloads.path());
    assert!(worker.run_cycle().await.is_err());
}

// ---------------------------------------------------------------------------
// Report retry against a scripted backend
// ---------------------------------------------------------------------------

const TASK_ID: &str = "6f1c1b0e-8d8a-4c55-9b0e-1f6a8f2d4c11";

#[derive(Clone, Default)]
struct Script {
    addr: Arc<std::sync::OnceLock<SocketAddr>>,
    downloads: Arc<AtomicUsize>,
    reports: Arc<AtomicUsize>,
}

async fn scripted_poll(State(script): State<Script>) -> Json<serde_json::Value> {
    let addr = script.addr.get().copied().unwrap();
    let tasks = if script.reports.load(Ordering::SeqCst) >= 2 {
        vec![]
    } else {
        vec![serde_json::json!({
            "id": TASK_ID,
            "device_ip": DEVICE_IP,
            "task_type": "upload_file",
            "file_url": format!("http://{addr}/files/exam.xlsx"),
            "file_name": "exam.xlsx",
            "payload": {},
            "status": "pending",
            "created_at": "2026-10-19T08:00:00Z",
            "completed_at": null,
        })]
    };
    Json(serde_json::json!({ "tasks": tasks, "deviceIp": DEVICE_IP }))
}

async fn scripted_report(State(script): State<Script>) -> StatusCode {
    // The first report is lost.
    if script.reports.fetch_add(1, Ordering::SeqCst) == 0 {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn scripted_file(State(script): State<Script>) -> &'static [u8] {
    script.downloads.fetch_add(1, Ordering::SeqCst);
    b"exam-bytes"
}

#[tokio::test]
async fn lost_report_is_retried_without_downloading_again() {
    let script = Script::default();
    let router = Router::new()
        .route("/api/v1/devices/heartbeat", post(|| async { StatusCode::OK }))
        .route(
            "/api/v1/devices/poll",
            get(scripted_poll).post(scripted_report),
        )
        .route("/files/exam.xlsx", get(scripted_file))
        .with_state(script.clone());
    let addr = serve(router).await;
    script.addr.set(addr).unwrap();

    let downloads = tempfile::tempdir().unwrap();
    let mut worker = Worker::new(client(addr), downloads.path());
    let task_id = TASK_ID.parse().unwrap();

    let first = worker.run_cycle().await.unwrap();
    assert_eq!((first.delivered, first.reported, first.skipped), (1, 0, 1));
    assert_eq!(
        worker.ledger().next_step(task_id),
        NextStep::ReportCompleted {
            path: downloads.path().join("exam.xlsx")
        }
    );

    let second = worker.run_cycle().await.unwrap();
    assert_eq!((second.delivered, second.reported, second.skipped), (1, 1, 0));
    assert_eq!(worker.ledger().next_step(task_id), NextStep::Skip);

    // No longer delivered, so the ledger lets go of it.
    let third = worker.run_cycle().await.unwrap();
    assert_eq!(third.delivered, 0);
    assert!(worker.ledger().is_empty());

    assert_eq!(script.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(script.reports.load(Ordering::SeqCst), 2);
}
