//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod attendance_repo;
pub mod device_repo;
pub mod heartbeat_repo;
pub mod task_repo;

pub use attendance_repo::AttendanceRepo;
pub use device_repo::DeviceRepo;
pub use heartbeat_repo::HeartbeatRepo;
pub use task_repo::TaskRepo;
