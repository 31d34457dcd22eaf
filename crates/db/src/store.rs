//! The persistence seam used by the API services.
//!
//! [`FleetStore`] is the injected collaborator every service receives as an
//! `Arc<dyn FleetStore>`. [`PgStore`] backs it with the repositories in this
//! crate; [`crate::MemoryStore`] is the in-process double used by tests.

use async_trait::async_trait;
use examhall_core::types::DbId;

use crate::models::attendance::{
    AttendanceReport, CreateReport, CreateStudentRecord, ReportWithDevice,
};
use crate::models::device::{CreateDevice, Device, UpdateDevice};
use crate::models::heartbeat::{DeviceHeartbeat, TouchHeartbeat, UpsertHeartbeat};
use crate::models::task::{CompleteTask, CreateTask, DeviceTask};
use crate::repositories::{AttendanceRepo, DeviceRepo, HeartbeatRepo, TaskRepo};
use crate::DbPool;

/// Failure of the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness rule was violated (raised by stores that enforce it
    /// themselves rather than through a database constraint).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the fleet services need from storage.
#[async_trait]
pub trait FleetStore: Send + Sync {
    /// Verify the backing store is reachable.
    async fn ping(&self) -> StoreResult<()>;

    // ── Devices (owner-scoped) ───────────────────────────────────────────

    async fn list_devices(&self, owner_id: DbId) -> StoreResult<Vec<Device>>;

    async fn find_device(&self, owner_id: DbId, id: DbId) -> StoreResult<Option<Device>>;

    async fn find_device_by_ip(
        &self,
        owner_id: DbId,
        ip_address: &str,
    ) -> StoreResult<Option<Device>>;

    async fn create_device(&self, owner_id: DbId, input: &CreateDevice) -> StoreResult<Device>;

    async fn update_device(
        &self,
        owner_id: DbId,
        id: DbId,
        input: &UpdateDevice,
    ) -> StoreResult<Option<Device>>;

    /// Returns `true` if the device existed. Its reports go with it.
    async fn delete_device(&self, owner_id: DbId, id: DbId) -> StoreResult<bool>;

    // ── Heartbeats ───────────────────────────────────────────────────────

    async fn upsert_heartbeat(&self, input: &UpsertHeartbeat) -> StoreResult<DeviceHeartbeat>;

    /// Like `upsert_heartbeat`, but leaves an existing `device_info` alone.
    async fn touch_heartbeat(&self, input: &TouchHeartbeat) -> StoreResult<DeviceHeartbeat>;

    async fn find_heartbeat(&self, device_ip: &str) -> StoreResult<Option<DeviceHeartbeat>>;

    async fn list_heartbeats(&self, device_ips: &[String]) -> StoreResult<Vec<DeviceHeartbeat>>;

    // ── Tasks ────────────────────────────────────────────────────────────

    async fn create_task(&self, input: &CreateTask) -> StoreResult<DeviceTask>;

    /// Oldest-first pending tasks for an IP, at most `limit`.
    async fn list_pending_tasks(&self, device_ip: &str, limit: i64)
        -> StoreResult<Vec<DeviceTask>>;

    async fn count_pending_tasks(&self, device_ip: &str) -> StoreResult<i64>;

    /// Returns `None` for an unknown task id.
    async fn complete_task(
        &self,
        id: DbId,
        input: &CompleteTask,
    ) -> StoreResult<Option<DeviceTask>>;

    // ── Attendance reports ───────────────────────────────────────────────

    async fn create_report(&self, input: &CreateReport) -> StoreResult<AttendanceReport>;

    async fn insert_student_records(
        &self,
        report_id: DbId,
        rows: &[CreateStudentRecord],
    ) -> StoreResult<u64>;

    async fn find_report(
        &self,
        owner_id: DbId,
        id: DbId,
    ) -> StoreResult<Option<ReportWithDevice>>;

    async fn list_reports(&self, owner_id: DbId) -> StoreResult<Vec<ReportWithDevice>>;

    async fn delete_report(&self, owner_id: DbId, id: DbId) -> StoreResult<bool>;
}

/// [`FleetStore`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl FleetStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn list_devices(&self, owner_id: DbId) -> StoreResult<Vec<Device>> {
        Ok(DeviceRepo::list_for_owner(&self.pool, owner_id).await?)
    }

    async fn find_device(&self, owner_id: DbId, id: DbId) -> StoreResult<Option<Device>> {
        Ok(DeviceRepo::find_for_owner(&self.pool, owner_id, id).await?)
    }

    async fn find_device_by_ip(
        &self,
        owner_id: DbId,
        ip_address: &str,
    ) -> StoreResult<Option<Device>> {
        Ok(DeviceRepo::find_by_ip_for_owner(&self.pool, owner_id, ip_address).await?)
    }

    async fn create_device(&self, owner_id: DbId, input: &CreateDevice) -> StoreResult<Device> {
        Ok(DeviceRepo::create(&self.pool, owner_id, input).await?)
    }

    async fn update_device(
        &self,
        owner_id: DbId,
        id: DbId,
        input: &UpdateDevice,
    ) -> StoreResult<Option<Device>> {
        Ok(DeviceRepo::update(&self.pool, owner_id, id, input).await?)
    }

    async fn delete_device(&self, owner_id: DbId, id: DbId) -> StoreResult<bool> {
        Ok(DeviceRepo::delete(&self.pool, owner_id, id).await?)
    }

    async fn upsert_heartbeat(&self, input: &UpsertHeartbeat) -> StoreResult<DeviceHeartbeat> {
        Ok(HeartbeatRepo::upsert(&self.pool, input).await?)
    }

    async fn touch_heartbeat(&self, input: &TouchHeartbeat) -> StoreResult<DeviceHeartbeat> {
        Ok(HeartbeatRepo::touch(&self.pool, input).await?)
    }

    async fn find_heartbeat(&self, device_ip: &str) -> StoreResult<Option<DeviceHeartbeat>> {
        Ok(HeartbeatRepo::find(&self.pool, device_ip).await?)
    }

    async fn list_heartbeats(&self, device_ips: &[String]) -> StoreResult<Vec<DeviceHeartbeat>> {
        Ok(HeartbeatRepo::list_for_ips(&self.pool, device_ips).await?)
    }

    async fn create_task(&self, input: &CreateTask) -> StoreResult<DeviceTask> {
        Ok(TaskRepo::create(&self.pool, input).await?)
    }

    async fn list_pending_tasks(
        &self,
        device_ip: &str,
        limit: i64,
    ) -> StoreResult<Vec<DeviceTask>> {
        Ok(TaskRepo::list_pending(&self.pool, device_ip, limit).await?)
    }

    async fn count_pending_tasks(&self, device_ip: &str) -> StoreResult<i64> {
        Ok(TaskRepo::count_pending(&self.pool, device_ip).await?)
    }

    async fn complete_task(
        &self,
        id: DbId,
        input: &CompleteTask,
    ) -> StoreResult<Option<DeviceTask>> {
        Ok(TaskRepo::complete(&self.pool, id, input).await?)
    }

    async fn create_report(&self, input: &CreateReport) -> StoreResult<AttendanceReport> {
        Ok(AttendanceRepo::create_report(&self.pool, input).await?)
    }

    async fn insert_student_records(
        &self,
        report_id: DbId,
        rows: &[CreateStudentRecord],
    ) -> StoreResult<u64> {
        Ok(AttendanceRepo::insert_students(&self.pool, report_id, rows).await?)
    }

    async fn find_report(
        &self,
        owner_id: DbId,
        id: DbId,
    ) -> StoreResult<Option<ReportWithDevice>> {
        Ok(AttendanceRepo::find_for_owner(&self.pool, owner_id, id).await?)
    }

    async fn list_reports(&self, owner_id: DbId) -> StoreResult<Vec<ReportWithDevice>> {
        Ok(AttendanceRepo::list_for_owner(&self.pool, owner_id).await?)
    }

    async fn delete_report(&self, owner_id: DbId, id: DbId) -> StoreResult<bool> {
        Ok(AttendanceRepo::delete_for_owner(&self.pool, owner_id, id).await?)
    }
}
