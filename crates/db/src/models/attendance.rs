//! Attendance report models and DTOs.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::FromRow;
use examhall_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity structs (match database tables)
// ---------------------------------------------------------------------------

/// A row from the `attendance_reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceReport {
    pub id: DbId,
    pub device_id: DbId,
    pub total_students: i32,
    pub present_students: i32,
    pub absent_students: i32,
    pub attendance_rate: f64,
    pub file_name: String,
    pub exam_date: NaiveDate,
    pub exam_time: NaiveTime,
    pub created_at: Timestamp,
}

/// A report joined with the device it came from.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportWithDevice {
    pub id: DbId,
    pub device_id: DbId,
    pub total_students: i32,
    pub present_students: i32,
    pub absent_students: i32,
    pub attendance_rate: f64,
    pub file_name: String,
    pub exam_date: NaiveDate,
    pub exam_time: NaiveTime,
    pub created_at: Timestamp,
    pub device_name: String,
    pub device_ip: String,
    pub owner_id: DbId,
}

/// A row from the `student_attendance` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentAttendanceRecord {
    pub id: DbId,
    pub report_id: DbId,
    pub student_name: String,
    pub status: String,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTOs
// ---------------------------------------------------------------------------

/// DTO for inserting a report. Totals are derived from the counts.
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub device_id: DbId,
    pub present_students: i32,
    pub absent_students: i32,
    pub attendance_rate: f64,
    pub file_name: String,
    pub exam_date: NaiveDate,
    pub exam_time: NaiveTime,
}

impl CreateReport {
    pub fn total_students(&self) -> i32 {
        self.present_students + self.absent_students
    }
}

/// DTO for one student line of a report.
#[derive(Debug, Clone)]
pub struct CreateStudentRecord {
    pub student_name: String,
    pub status: String,
}
