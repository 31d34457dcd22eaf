//! Attendance roster parsing and statistics.
//!
//! Rosters arrive as the first worksheet of a spreadsheet exported by a
//! device. The sheet is handed to this module as plain text rows, header row
//! first.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Header of the student name column.
pub const HEADER_STUDENT_NAME: &str = "Student_Name";

/// Header of the attendance status column.
pub const HEADER_STATUS: &str = "Status";

/// Header of the exam date column in exported sheets.
pub const HEADER_DATE: &str = "Date";

/// Spreadsheet extensions accepted for ingestion.
const ACCEPTED_EXTENSIONS: &[&str] = &[".xlsx", ".xls"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Attendance status of one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    /// Parse a sheet cell, case-insensitively and ignoring surrounding space.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("present") {
            Some(Self::Present)
        } else if value.eq_ignore_ascii_case("absent") {
            Some(Self::Absent)
        } else {
            None
        }
    }

    /// Canonical label used in stored rows and exported sheets.
    pub fn label(self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
        }
    }
}

/// One student line of an ingested roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentLine {
    pub name: String,
    pub status: AttendanceStatus,
}

/// Present/absent counts for a roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceTally {
    pub present: i32,
    pub absent: i32,
}

impl AttendanceTally {
    pub fn total(&self) -> i32 {
        self.present + self.absent
    }

    /// Percentage of present students; `0.0` for an empty roster.
    pub fn rate(&self) -> f64 {
        attendance_rate(self.present, self.total())
    }
}

/// A fully validated roster.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    pub students: Vec<StudentLine>,
    pub tally: AttendanceTally,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// `present / total * 100`, or `0.0` when `total` is zero.
pub fn attendance_rate(present: i32, total: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    f64::from(present) / f64::from(total) * 100.0
}

/// Round a rate to two decimals for display.
pub fn round_rate(rate: f64) -> f64 {
    (rate * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Validation / parsing
// ---------------------------------------------------------------------------

/// Reject uploads that are not spreadsheet files.
pub fn validate_roster_file_name(file_name: &str) -> Result<(), CoreError> {
    let lower = file_name.to_ascii_lowercase();
    if ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Invalid file type. Only Excel files (.xlsx, .xls) are allowed".to_string(),
        ))
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|s| s.trim()).unwrap_or("")
}

/// Parse and validate roster rows (header row first).
///
/// Rows whose name or status cell is empty are skipped. Any other status
/// than present/absent aborts the whole roster: nothing is partially
/// accepted.
pub fn parse_roster(rows: &[Vec<String>]) -> Result<Roster, CoreError> {
    if rows.len() < 2 {
        return Err(CoreError::Validation(
            "Spreadsheet must contain a header row and at least one data row".to_string(),
        ));
    }

    let header = &rows[0];
    let position = |name: &str| header.iter().position(|h| h.trim() == name);
    let name_idx = position(HEADER_STUDENT_NAME);
    let status_idx = position(HEADER_STATUS);

    let (name_idx, status_idx) = match (name_idx, status_idx) {
        (Some(n), Some(s)) => (n, s),
        _ => {
            let missing: Vec<&str> = [
                (HEADER_STUDENT_NAME, name_idx),
                (HEADER_STATUS, status_idx),
            ]
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| *name)
            .collect();
            return Err(CoreError::Validation(format!(
                "Missing required columns: {}. Required: {HEADER_STUDENT_NAME}, {HEADER_STATUS}",
                missing.join(", ")
            )));
        }
    };

    let mut students = Vec::new();
    let mut tally = AttendanceTally::default();

    for row in &rows[1..] {
        let name = cell(row, name_idx);
        let raw_status = cell(row, status_idx);
        if name.is_empty() || raw_status.is_empty() {
            continue;
        }

        let status = AttendanceStatus::parse(raw_status).ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid status \"{raw_status}\" for student \"{name}\". \
                 Status must be \"Present\" or \"Absent\""
            ))
        })?;

        match status {
            AttendanceStatus::Present => tally.present += 1,
            AttendanceStatus::Absent => tally.absent += 1,
        }
        students.push(StudentLine {
            name: name.to_string(),
            status,
        });
    }

    if students.is_empty() {
        return Err(CoreError::Validation(
            "No valid student data found in spreadsheet".to_string(),
        ));
    }

    Ok(Roster { students, tally })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
