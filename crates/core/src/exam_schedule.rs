//! Exam date/time resolution and exam-file naming.
//!
//! Exam rooms operate on a fixed UTC+1 wall clock regardless of daylight
//! saving, so every "local" date or time in reports and file names is derived
//! from the UTC instant plus [`EXAM_UTC_OFFSET_SECS`].

use std::sync::LazyLock;

use chrono::{FixedOffset, NaiveDate, NaiveTime, Timelike};
use regex::Regex;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Offset of the exam-room wall clock from UTC, in seconds.
pub const EXAM_UTC_OFFSET_SECS: i32 = 3600;

/// `_YYYYMMDD_HHMMSS` fragment devices embed in exported attendance files.
static CAPTURE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_\d{8}_(\d{2})(\d{2})(\d{2})").expect("valid regex"));

// ---------------------------------------------------------------------------
// Wall clock
// ---------------------------------------------------------------------------

fn exam_offset() -> FixedOffset {
    FixedOffset::east_opt(EXAM_UTC_OFFSET_SECS).expect("offset within one day")
}

/// The exam-room wall-clock date for a UTC instant.
pub fn local_date(now: Timestamp) -> NaiveDate {
    now.with_timezone(&exam_offset()).date_naive()
}

/// The exam-room wall-clock time for a UTC instant, truncated to seconds.
pub fn local_time(now: Timestamp) -> NaiveTime {
    let time = now.with_timezone(&exam_offset()).time();
    time.with_nanosecond(0).unwrap_or(time)
}

/// Extract the capture time from a `..._YYYYMMDD_HHMMSS...` file name.
///
/// Returns `None` when the fragment is absent or is not a valid clock time.
pub fn time_from_file_name(file_name: &str) -> Option<NaiveTime> {
    let caps = CAPTURE_TIME_RE.captures(file_name)?;
    let part = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    NaiveTime::from_hms_opt(part(1)?, part(2)?, part(3)?)
}

/// Resolve the exam date and time recorded for a report ingested at `now`.
///
/// The date is always the ingestion date; the time comes from the file name
/// when it carries one, else the ingestion time.
pub fn resolve_exam_moment(file_name: &str, now: Timestamp) -> (NaiveDate, NaiveTime) {
    let date = local_date(now);
    let time = time_from_file_name(file_name).unwrap_or_else(|| local_time(now));
    (date, time)
}

// ---------------------------------------------------------------------------
// Exam window
// ---------------------------------------------------------------------------

/// The period during which facial recognition runs for a scheduled file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

fn parse_clock(label: &str, value: &str) -> Result<NaiveTime, CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Validation(format!("{label} time is required")));
    }
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
        CoreError::Validation(format!("{label} time '{value}' must be formatted HH:MM"))
    })
}

/// Parse and validate an `HH:MM` start/end pair.
pub fn parse_exam_window(start: &str, end: &str) -> Result<ExamWindow, CoreError> {
    let start = parse_clock("Start", start)?;
    let end = parse_clock("End", end)?;
    if end <= start {
        return Err(CoreError::Validation(
            "End time must be after start time".to_string(),
        ));
    }
    Ok(ExamWindow { start, end })
}

/// Build the name a scheduled exam file is stored and delivered under:
/// `{stem}_{YYYY-MM-DD}_{HH-MM}_{HH-MM}.{ext}`.
pub fn scheduled_file_name(original: &str, date: NaiveDate, window: &ExamWindow) -> String {
    let (stem, ext) = match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (original, None),
    };
    let base = format!(
        "{stem}_{}_{}_{}",
        date.format("%Y-%m-%d"),
        window.start.format("%H-%M"),
        window.end.format("%H-%M"),
    );
    match ext {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}
