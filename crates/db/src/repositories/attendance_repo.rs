//! Repository for the `attendance_reports` and `student_attendance` tables.

use sqlx::PgPool;
use examhall_core::types::DbId;

use crate::models::attendance::{
    AttendanceReport, CreateReport, CreateStudentRecord, ReportWithDevice,
    StudentAttendanceRecord,
};

/// Column list for `attendance_reports` queries.
const COLUMNS: &str = "\
    id, device_id, total_students, present_students, absent_students, \
    attendance_rate, file_name, exam_date, exam_time, created_at";

/// Report columns qualified with `r.` plus the joined device columns.
const JOINED_COLUMNS: &str = "\
    r.id, r.device_id, r.total_students, r.present_students, r.absent_students, \
    r.attendance_rate, r.file_name, r.exam_date, r.exam_time, r.created_at, \
    d.name AS device_name, d.ip_address AS device_ip, d.owner_id";

/// Column list for `student_attendance` queries.
const STUDENT_COLUMNS: &str = "id, report_id, student_name, status, created_at";

pub struct AttendanceRepo;

impl AttendanceRepo {
    // ── Reports ──────────────────────────────────────────────────────────

    pub async fn create_report(
        pool: &PgPool,
        input: &CreateReport,
    ) -> Result<AttendanceReport, sqlx::Error> {
        let query = format!(
            "INSERT INTO attendance_reports (device_id, total_students, present_students, \
                absent_students, attendance_rate, file_name, exam_date, exam_time)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceReport>(&query)
            .bind(input.device_id)
            .bind(input.total_students())
            .bind(input.present_students)
            .bind(input.absent_students)
            .bind(input.attendance_rate)
            .bind(&input.file_name)
            .bind(input.exam_date)
            .bind(input.exam_time)
            .fetch_one(pool)
            .await
    }

    /// Find a report with its device, provided the owner owns that device.
    pub async fn find_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        id: DbId,
    ) -> Result<Option<ReportWithDevice>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM attendance_reports r \
             JOIN devices d ON d.id = r.device_id \
             WHERE r.id = $1 AND d.owner_id = $2"
        );
        sqlx::query_as::<_, ReportWithDevice>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// All of an owner's reports, newest first.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<ReportWithDevice>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM attendance_reports r \
             JOIN devices d ON d.id = r.device_id \
             WHERE d.owner_id = $1 \
             ORDER BY r.created_at DESC, r.id"
        );
        sqlx::query_as::<_, ReportWithDevice>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a report owned through its device. Student rows cascade.
    pub async fn delete_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM attendance_reports r USING devices d \
             WHERE r.id = $1 AND d.id = r.device_id AND d.owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Student rows ─────────────────────────────────────────────────────

    /// Bulk-insert student lines for a report. Returns the number inserted.
    pub async fn insert_students(
        pool: &PgPool,
        report_id: DbId,
        rows: &[CreateStudentRecord],
    ) -> Result<u64, sqlx::Error> {
        if rows.is_empty() {
            return Ok(0);
        }
        let names: Vec<&str> = rows.iter().map(|r| r.student_name.as_str()).collect();
        let statuses: Vec<&str> = rows.iter().map(|r| r.status.as_str()).collect();

        let result = sqlx::query(
            "INSERT INTO student_attendance (report_id, student_name, status) \
             SELECT $1::uuid, * FROM UNNEST($2::text[], $3::text[])",
        )
        .bind(report_id)
        .bind(names)
        .bind(statuses)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_students(
        pool: &PgPool,
        report_id: DbId,
    ) -> Result<Vec<StudentAttendanceRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {STUDENT_COLUMNS} FROM student_attendance \
             WHERE report_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, StudentAttendanceRecord>(&query)
            .bind(report_id)
            .fetch_all(pool)
            .await
    }
}
