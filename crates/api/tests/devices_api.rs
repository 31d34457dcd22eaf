//! HTTP-level tests for owner-scoped device management and exam-file
//! scheduling.

mod common;

use axum::http::StatusCode;
use common::{body_bytes, body_json, Part, TestApp};
use examhall_core::types::DbId;
use serde_json::json;

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_device_returns_201() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    let device = app.create_device(owner, " Hall 1 ", "192.168.1.20").await;

    assert_eq!(device["name"], "Hall 1");
    assert_eq!(device["ip_address"], "192.168.1.20");
    assert_eq!(device["owner_id"], owner.to_string());
}

#[tokio::test]
async fn invalid_device_input_is_400() {
    let app = TestApp::new();
    let token = app.token(DbId::new_v4());

    for body in [
        json!({"name": "", "ip_address": "10.0.0.1"}),
        json!({"name": "Hall", "ip_address": "10.0.0"}),
        json!({"name": "Hall", "ip_address": "10.0.0.256"}),
    ] {
        let response = app.post_json("/api/v1/devices", body, Some(&token)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn duplicate_ip_for_same_owner_is_409() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    app.create_device(owner, "A", "10.0.0.1").await;
    app.create_device(DbId::new_v4(), "B", "10.0.0.1").await;

    let token = app.token(owner);
    let response = app
        .post_json(
            "/api/v1/devices",
            json!({"name": "C", "ip_address": "10.0.0.1"}),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn list_only_shows_own_devices_with_status() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    app.create_device(owner, "A", "10.0.0.1").await;
    app.create_device(owner, "B", "10.0.0.2").await;
    app.create_device(DbId::new_v4(), "C", "10.0.0.3").await;
    app.post_json(
        "/api/v1/devices/heartbeat",
        json!({"deviceIp": "10.0.0.2"}),
        None,
    )
    .await;

    let token = app.token(owner);
    let json = body_json(app.get("/api/v1/devices", Some(&token)).await).await;
    let devices = json["data"].as_array().unwrap();
    assert_eq!(devices.len(), 2);
    // Newest first.
    assert_eq!(devices[0]["name"], "B");
    assert_eq!(devices[0]["online"], true);
    assert_eq!(devices[1]["name"], "A");
    assert_eq!(devices[1]["online"], false);

    let statuses = body_json(app.get("/api/v1/devices/statuses", Some(&token)).await).await;
    assert_eq!(statuses["data"], json!({"10.0.0.1": false, "10.0.0.2": true}));
}

#[tokio::test]
async fn update_and_delete_device() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    let token = app.token(owner);
    let id = app.create_device(owner, "A", "10.0.0.1").await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/v1/devices/{id}");

    let response = app
        .put_json(&uri, json!({"name": "Renamed"}), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Renamed");
    assert_eq!(json["data"]["ip_address"], "10.0.0.1");

    let response = app.get(&uri, Some(&token)).await;
    assert_eq!(body_json(response).await["data"]["online"], false);

    let response = app.delete(&uri, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.get(&uri, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn foreign_device_is_404() {
    let app = TestApp::new();
    let id = app.create_device(DbId::new_v4(), "A", "10.0.0.1").await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/v1/devices/{id}");
    let stranger = app.token(DbId::new_v4());

    assert_eq!(app.get(&uri, Some(&stranger)).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.put_json(&uri, json!({"name": "X"}), Some(&stranger))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.delete(&uri, Some(&stranger)).await.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pending_task_count() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    let token = app.token(owner);
    let id = app.create_device(owner, "A", "10.0.0.1").await["id"]
        .as_str()
        .unwrap()
        .to_string();

    for _ in 0..3 {
        app.post_json(
            "/api/v1/devices/queue-task",
            json!({"deviceIp": "10.0.0.1", "taskType": "upload_file"}),
            Some(&token),
        )
        .await;
    }

    let json = body_json(
        app.get(&format!("/api/v1/devices/{id}/pending-tasks"), Some(&token))
            .await,
    )
    .await;
    assert_eq!(json["data"]["count"], 3);
}

#[tokio::test]
async fn exam_file_is_stored_and_queued() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    let token = app.token(owner);
    let id = app.create_device(owner, "A", "10.0.0.1").await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .post_multipart(
            &format!("/api/v1/devices/{id}/exam-file"),
            &[
                Part::File {
                    name: "file",
                    file_name: "students.xlsx",
                    bytes: b"roster-bytes",
                },
                Part::Text {
                    name: "startTime",
                    value: "09:00",
                },
                Part::Text {
                    name: "endTime",
                    value: "11:30",
                },
            ],
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let task = body_json(response).await["data"].clone();
    assert_eq!(task["task_type"], "upload_file");
    assert_eq!(task["device_ip"], "10.0.0.1");
    assert_eq!(task["payload"]["startTime"], "09:00");
    assert_eq!(task["payload"]["originalFileName"], "students.xlsx");

    let file_name = task["file_name"].as_str().unwrap();
    assert!(file_name.starts_with("students_"));
    assert!(file_name.ends_with("_09-00_11-30.xlsx"));

    // The device downloads it from the public URL.
    let file_url = task["file_url"].as_str().unwrap();
    let path = file_url.strip_prefix(common::PUBLIC_BASE_URL).unwrap();
    let response = app.get(path, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"roster-bytes");

    let polled = body_json(app.get("/api/v1/devices/poll?deviceIp=10.0.0.1", None).await).await;
    assert_eq!(polled["tasks"][0]["id"], task["id"]);
}

#[tokio::test]
async fn exam_file_with_bad_window_is_400() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    let token = app.token(owner);
    let id = app.create_device(owner, "A", "10.0.0.1").await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .post_multipart(
            &format!("/api/v1/devices/{id}/exam-file"),
            &[
                Part::File {
                    name: "file",
                    file_name: "students.xlsx",
                    bytes: b"x",
                },
                Part::Text {
                    name: "startTime",
                    value: "11:30",
                },
                Part::Text {
                    name: "endTime",
                    value: "09:00",
                },
            ],
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
