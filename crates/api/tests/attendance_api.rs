//! HTTP-level tests for attendance report upload, download, listing and
//! deletion.

mod common;

use axum::http::{header, StatusCode};
use common::{body_bytes, body_json, roster, Part, TestApp};
use examhall_api::spreadsheet::read_first_sheet;
use examhall_core::types::DbId;

async fn upload(app: &TestApp, token: &str, ip: &str, file_name: &str, bytes: &[u8]) -> axum::response::Response {
    app.post_multipart(
        "/api/v1/attendance/upload",
        &[
            Part::File {
                name: "file",
                file_name,
                bytes,
            },
            Part::Text {
                name: "deviceIp",
                value: ip,
            },
        ],
        Some(token),
    )
    .await
}

#[tokio::test]
async fn upload_returns_summary() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    let token = app.token(owner);
    app.create_device(owner, "Hall 3", "10.0.0.3").await;

    let bytes = roster(&[["A", "Present"], ["B", "Absent"]]);
    let response = upload(&app, &token, "10.0.0.3", "roster.xlsx", &bytes).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Attendance report processed successfully");
    let data = &json["data"];
    assert_eq!(data["deviceName"], "Hall 3");
    assert_eq!(data["deviceIp"], "10.0.0.3");
    assert_eq!(data["totalStudents"], 2);
    assert_eq!(data["presentStudents"], 1);
    assert_eq!(data["absentStudents"], 1);
    assert_eq!(data["attendanceRate"], 50.0);
    assert_eq!(data["fileName"], "roster.xlsx");
    assert!(data["reportId"].is_string());
}

#[tokio::test]
async fn upload_without_file_is_400() {
    let app = TestApp::new();
    let token = app.token(DbId::new_v4());
    let response = app
        .post_multipart(
            "/api/v1/attendance/upload",
            &[Part::Text {
                name: "deviceIp",
                value: "10.0.0.3",
            }],
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_rejects_bad_rosters() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    let token = app.token(owner);
    app.create_device(owner, "Hall", "10.0.0.3").await;

    let invalid_status = roster(&[["A", "Present"], ["B", "Maybe"]]);
    let response = upload(&app, &token, "10.0.0.3", "r.xlsx", &invalid_status).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("Maybe"));

    let response = upload(&app, &token, "10.0.0.3", "r.csv", b"a,b").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = upload(&app, &token, "10.0.0.3", "r.xlsx", b"not a workbook").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let listed = body_json(app.get("/api/v1/attendance/reports", Some(&token)).await).await;
    assert_eq!(listed["data"], serde_json::json!([]));
}

#[tokio::test]
async fn upload_for_unknown_device_is_404() {
    let app = TestApp::new();
    let token = app.token(DbId::new_v4());
    let bytes = roster(&[["A", "Present"]]);
    let response = upload(&app, &token, "10.9.9.9", "r.xlsx", &bytes).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_synthesizes_workbook() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    let token = app.token(owner);
    app.create_device(owner, "Hall 3", "10.0.0.3").await;

    let bytes = roster(&[
        ["A", "Present"],
        ["B", "Present"],
        ["C", "Present"],
        ["D", "Absent"],
        ["E", "absent"],
    ]);
    let json = body_json(
        upload(&app, &token, "10.0.0.3", "attendance_hall_20250310_093000.xlsx", &bytes).await,
    )
    .await;
    let report_id = json["data"]["reportId"].as_str().unwrap().to_string();
    let exam_date = json["data"]["examDate"].as_str().unwrap().replace('-', "");

    let response = app
        .get(&format!("/api/v1/attendance/download/{report_id}"), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap(),
        format!(
            "attachment; filename=\"attendance_hall_20250310_093000_Hall_3_{exam_date}_093000.xlsx\""
        )
    );

    let rows = read_first_sheet(body_bytes(response).await).unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0], vec!["Student_Name", "Status", "Date"]);
    assert_eq!(rows.iter().filter(|r| r[1] == "Present").count(), 3);
    assert_eq!(rows.iter().filter(|r| r[1] == "Absent").count(), 2);
}

#[tokio::test]
async fn foreign_report_is_404() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    let token = app.token(owner);
    app.create_device(owner, "Hall", "10.0.0.3").await;
    let bytes = roster(&[["A", "Present"]]);
    let json = body_json(upload(&app, &token, "10.0.0.3", "r.xlsx", &bytes).await).await;
    let report_id = json["data"]["reportId"].as_str().unwrap().to_string();

    let stranger = app.token(DbId::new_v4());
    let response = app
        .get(&format!("/api/v1/attendance/download/{report_id}"), Some(&stranger))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .get(&format!("/api/v1/attendance/download/{report_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_and_delete_reports() {
    let app = TestApp::new();
    let owner = DbId::new_v4();
    let token = app.token(owner);
    app.create_device(owner, "Hall", "10.0.0.3").await;
    let bytes = roster(&[["A", "Present"]]);
    upload(&app, &token, "10.0.0.3", "first.xlsx", &bytes).await;
    let json = body_json(upload(&app, &token, "10.0.0.3", "second.xlsx", &bytes).await).await;
    let second_id = json["data"]["reportId"].as_str().unwrap().to_string();

    let listed = body_json(app.get("/api/v1/attendance/reports", Some(&token)).await).await;
    let reports = listed["data"].as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["file_name"], "second.xlsx");
    assert_eq!(reports[0]["device_name"], "Hall");

    let uri = format!("/api/v1/attendance/reports/{second_id}");
    assert_eq!(app.delete(&uri, Some(&token)).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.delete(&uri, Some(&token)).await.status(), StatusCode::NOT_FOUND);

    let listed = body_json(app.get("/api/v1/attendance/reports", Some(&token)).await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}
