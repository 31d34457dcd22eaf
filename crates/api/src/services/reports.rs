//! Attendance report ingestion, export and housekeeping.

use chrono::{NaiveDate, NaiveTime};
use examhall_core::attendance::{parse_roster, round_rate, validate_roster_file_name};
use examhall_core::devices::require_device_ip;
use examhall_core::error::CoreError;
use examhall_core::exam_schedule::resolve_exam_moment;
use examhall_core::report_export::{
    download_file_name, synthesize_rows, EXPORT_HEADER, EXPORT_SHEET_NAME,
};
use examhall_core::types::{DbId, Timestamp};
use examhall_db::models::attendance::{CreateReport, CreateStudentRecord, ReportWithDevice};
use examhall_db::FleetStore;
use serde::Serialize;

use crate::error::AppResult;
use crate::spreadsheet::{read_first_sheet, write_workbook};

/// What the uploader gets back after a successful ingestion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub report_id: DbId,
    pub device_name: String,
    pub device_ip: String,
    pub total_students: i32,
    pub present_students: i32,
    pub absent_students: i32,
    /// Percentage rounded to two decimals.
    pub attendance_rate: f64,
    pub file_name: String,
    pub exam_date: NaiveDate,
    pub exam_time: NaiveTime,
}

/// An exported report ready to be sent as a download.
#[derive(Debug)]
pub struct ExportedReport {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// Ingest a roster spreadsheet uploaded for one of the caller's devices.
///
/// The whole roster is validated before anything is written. The report row
/// is written first; per-student rows are best effort and a failure to store
/// them is only logged.
pub async fn ingest(
    store: &dyn FleetStore,
    owner_id: DbId,
    device_ip: Option<&str>,
    file_name: &str,
    bytes: Vec<u8>,
    now: Timestamp,
) -> AppResult<ReportSummary> {
    let device_ip = require_device_ip(device_ip)?;
    let device = store
        .find_device_by_ip(owner_id, device_ip)
        .await?
        .ok_or_else(|| CoreError::not_found("Device", device_ip))?;

    validate_roster_file_name(file_name)?;
    let rows = read_first_sheet(bytes)?;
    let roster = parse_roster(&rows)?;

    let (exam_date, exam_time) = resolve_exam_moment(file_name, now);
    let report = store
        .create_report(&CreateReport {
            device_id: device.id,
            present_students: roster.tally.present,
            absent_students: roster.tally.absent,
            attendance_rate: roster.tally.rate(),
            file_name: file_name.to_string(),
            exam_date,
            exam_time,
        })
        .await?;

    let students: Vec<CreateStudentRecord> = roster
        .students
        .iter()
        .map(|s| CreateStudentRecord {
            student_name: s.name.clone(),
            status: s.status.label().to_string(),
        })
        .collect();
    if let Err(e) = store.insert_student_records(report.id, &students).await {
        tracing::warn!(report_id = %report.id, error = %e, "Failed to store student rows; report kept");
    }

    tracing::info!(
        report_id = %report.id,
        device_ip = %device.ip_address,
        total = report.total_students,
        present = report.present_students,
        owner_id = %owner_id,
        "Attendance report ingested",
    );

    Ok(ReportSummary {
        report_id: report.id,
        device_name: device.name,
        device_ip: device.ip_address,
        total_students: report.total_students,
        present_students: report.present_students,
        absent_students: report.absent_students,
        attendance_rate: round_rate(report.attendance_rate),
        file_name: report.file_name,
        exam_date: report.exam_date,
        exam_time: report.exam_time,
    })
}

async fn owned_report(
    store: &dyn FleetStore,
    owner_id: DbId,
    report_id: DbId,
) -> AppResult<ReportWithDevice> {
    Ok(store
        .find_report(owner_id, report_id)
        .await?
        .ok_or_else(|| CoreError::not_found("AttendanceReport", report_id))?)
}

/// Build the download for one of the caller's reports.
///
/// The sheet is synthesized from the aggregate counts, not the stored
/// student rows.
pub async fn export(
    store: &dyn FleetStore,
    owner_id: DbId,
    report_id: DbId,
) -> AppResult<ExportedReport> {
    let report = owned_report(store, owner_id, report_id).await?;

    let rows = synthesize_rows(report.present_students, report.absent_students, report.exam_date);
    let bytes = write_workbook(
        EXPORT_SHEET_NAME,
        &EXPORT_HEADER,
        rows.iter().map(|r| r.cells()),
    )?;
    let file_name = download_file_name(
        &report.file_name,
        &report.device_name,
        report.exam_date,
        report.exam_time,
    );

    tracing::debug!(report_id = %report.id, rows = rows.len(), "Report exported");
    Ok(ExportedReport { bytes, file_name })
}

/// The caller's reports, newest first.
pub async fn list(store: &dyn FleetStore, owner_id: DbId) -> AppResult<Vec<ReportWithDevice>> {
    Ok(store.list_reports(owner_id).await?)
}

/// Delete one of the caller's reports along with its student rows.
pub async fn delete(store: &dyn FleetStore, owner_id: DbId, report_id: DbId) -> AppResult<()> {
    if !store.delete_report(owner_id, report_id).await? {
        return Err(CoreError::not_found("AttendanceReport", report_id).into());
    }
    tracing::info!(report_id = %report_id, owner_id = %owner_id, "Attendance report deleted");
    Ok(())
}
