//! Attendance report export.
//!
//! Only aggregate counts are guaranteed to exist for a report, so exports are
//! synthesized from them: placeholder student names, one row per counted
//! student. An export never reproduces the ingested roster.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::attendance::{AttendanceStatus, HEADER_DATE, HEADER_STATUS, HEADER_STUDENT_NAME};

/// Worksheet name of exported reports.
pub const EXPORT_SHEET_NAME: &str = "Attendance";

/// Header row of exported reports.
pub const EXPORT_HEADER: [&str; 3] = [HEADER_STUDENT_NAME, HEADER_STATUS, HEADER_DATE];

/// Suffix appended by exam-file scheduling: `_YYYY-MM-DD_HH-MM_HH-MM`.
static SCHEDULE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)_\d{4}-\d{2}-\d{2}_\d{2}-\d{2}_\d{2}-\d{2}$").expect("valid regex")
});

/// One synthesized data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub student_name: String,
    pub status: AttendanceStatus,
    pub date: String,
}

impl ExportRow {
    pub fn cells(&self) -> [&str; 3] {
        [self.student_name.as_str(), self.status.label(), self.date.as_str()]
    }
}

/// Synthesize export rows: `present` rows labelled Present, then `absent`
/// rows labelled Absent, named `Student 001`, `Student 002`, ... across both.
///
/// Negative counts are treated as zero.
pub fn synthesize_rows(present: i32, absent: i32, exam_date: NaiveDate) -> Vec<ExportRow> {
    let present = present.max(0) as usize;
    let absent = absent.max(0) as usize;
    let date = exam_date.format("%Y-%m-%d").to_string();

    std::iter::repeat(AttendanceStatus::Present)
        .take(present)
        .chain(std::iter::repeat(AttendanceStatus::Absent).take(absent))
        .enumerate()
        .map(|(i, status)| ExportRow {
            student_name: format!("Student {:03}", i + 1),
            status,
            date: date.clone(),
        })
        .collect()
}

/// Recover the user-facing name of a stored report file: extension removed,
/// and the scheduling suffix removed when present.
pub fn original_file_stem(file_name: &str) -> &str {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    SCHEDULE_SUFFIX_RE
        .captures(stem)
        .and_then(|caps| caps.get(1))
        .map_or(stem, |m| m.as_str())
}

/// Download name: `{original}_{device}_{YYYYMMDD}_{HHMMSS}.xlsx`.
pub fn download_file_name(
    stored_file_name: &str,
    device_name: &str,
    exam_date: NaiveDate,
    exam_time: NaiveTime,
) -> String {
    let device = device_name.split_whitespace().collect::<Vec<_>>().join("_");
    format!(
        "{}_{}_{}_{}.xlsx",
        original_file_stem(stored_file_name),
        device,
        exam_date.format("%Y%m%d"),
        exam_time.format("%H%M%S"),
    )
}
