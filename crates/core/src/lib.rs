//! Domain logic for the exam-hall device fleet.
//!
//! Pure functions, constants and validation shared by the API server and the
//! device agent. Nothing in this crate performs I/O.

pub mod attendance;
pub mod devices;
pub mod error;
pub mod exam_schedule;
pub mod files;
pub mod liveness;
pub mod optimistic;
pub mod report_export;
pub mod task_queue;
pub mod types;
