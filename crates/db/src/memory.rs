//! In-process [`FleetStore`] used by tests and local tooling.
//!
//! Mirrors the PostgreSQL schema's behaviour: owner scoping, the
//! `(owner_id, ip_address)` uniqueness rule, FIFO task ordering and cascading
//! report deletion. Individual operations can be made to fail to exercise
//! fail-closed and best-effort paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use examhall_core::task_queue::TASK_STATUS_PENDING;
use examhall_core::types::DbId;
use tokio::sync::Mutex;

use crate::models::attendance::{
    AttendanceReport, CreateReport, CreateStudentRecord, ReportWithDevice,
    StudentAttendanceRecord,
};
use crate::models::device::{CreateDevice, Device, UpdateDevice};
use crate::models::heartbeat::{DeviceHeartbeat, TouchHeartbeat, UpsertHeartbeat};
use crate::models::task::{CompleteTask, CreateTask, DeviceTask};
use crate::store::{FleetStore, StoreError, StoreResult};

const OWNER_IP_CONSTRAINT: &str = "uq_devices_owner_ip";

#[derive(Default)]
struct Inner {
    devices: Vec<Device>,
    heartbeats: HashMap<String, DeviceHeartbeat>,
    tasks: Vec<DeviceTask>,
    reports: Vec<AttendanceReport>,
    students: Vec<StudentAttendanceRecord>,
}

impl Inner {
    fn ip_taken(&self, owner_id: DbId, ip_address: &str, except: Option<DbId>) -> bool {
        self.devices.iter().any(|d| {
            d.owner_id == owner_id && d.ip_address == ip_address && Some(d.id) != except
        })
    }

    fn join(&self, report: &AttendanceReport) -> Option<ReportWithDevice> {
        let device = self.devices.iter().find(|d| d.id == report.device_id)?;
        Some(ReportWithDevice {
            id: report.id,
            device_id: report.device_id,
            total_students: report.total_students,
            present_students: report.present_students,
            absent_students: report.absent_students,
            attendance_rate: report.attendance_rate,
            file_name: report.file_name.clone(),
            exam_date: report.exam_date,
            exam_time: report.exam_time,
            created_at: report.created_at,
            device_name: device.name.clone(),
            device_ip: device.ip_address.clone(),
            owner_id: device.owner_id,
        })
    }

    fn remove_reports(&mut self, ids: &[DbId]) {
        self.reports.retain(|r| !ids.contains(&r.id));
        self.students.retain(|s| !ids.contains(&s.report_id));
    }
}

/// Mutex-guarded in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_heartbeat_reads: AtomicBool,
    fail_heartbeat_writes: AtomicBool,
    fail_student_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make heartbeat lookups fail with [`StoreError::Unavailable`].
    pub fn set_fail_heartbeat_reads(&self, fail: bool) {
        self.fail_heartbeat_reads.store(fail, Ordering::SeqCst);
    }

    /// Make heartbeat upserts and touches fail with [`StoreError::Unavailable`].
    pub fn set_fail_heartbeat_writes(&self, fail: bool) {
        self.fail_heartbeat_writes.store(fail, Ordering::SeqCst);
    }

    /// Make student-row inserts fail with [`StoreError::Unavailable`].
    pub fn set_fail_student_inserts(&self, fail: bool) {
        self.fail_student_inserts.store(fail, Ordering::SeqCst);
    }

    /// Insert a fully-formed task row, e.g. with a chosen `created_at`.
    pub async fn seed_task(&self, task: DeviceTask) {
        self.inner.lock().await.tasks.push(task);
    }

    /// Student rows stored for a report.
    pub async fn student_records(&self, report_id: DbId) -> Vec<StudentAttendanceRecord> {
        self.inner
            .lock()
            .await
            .students
            .iter()
            .filter(|s| s.report_id == report_id)
            .cloned()
            .collect()
    }

    /// Look a task up by id regardless of status.
    pub async fn task(&self, id: DbId) -> Option<DeviceTask> {
        self.inner
            .lock()
            .await
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    fn check(flag: &AtomicBool, what: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!("{what} unavailable")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FleetStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list_devices(&self, owner_id: DbId) -> StoreResult<Vec<Device>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .devices
            .iter()
            .rev()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_device(&self, owner_id: DbId, id: DbId) -> StoreResult<Option<Device>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .devices
            .iter()
            .find(|d| d.id == id && d.owner_id == owner_id)
            .cloned())
    }

    async fn find_device_by_ip(
        &self,
        owner_id: DbId,
        ip_address: &str,
    ) -> StoreResult<Option<Device>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .devices
            .iter()
            .find(|d| d.ip_address == ip_address && d.owner_id == owner_id)
            .cloned())
    }

    async fn create_device(&self, owner_id: DbId, input: &CreateDevice) -> StoreResult<Device> {
        let mut inner = self.inner.lock().await;
        if inner.ip_taken(owner_id, &input.ip_address, None) {
            return Err(StoreError::Conflict(OWNER_IP_CONSTRAINT.to_string()));
        }
        let now = Utc::now();
        let device = Device {
            id: DbId::new_v4(),
            name: input.name.clone(),
            ip_address: input.ip_address.clone(),
            owner_id,
            created_at: now,
            updated_at: now,
        };
        inner.devices.push(device.clone());
        Ok(device)
    }

    async fn update_device(
        &self,
        owner_id: DbId,
        id: DbId,
        input: &UpdateDevice,
    ) -> StoreResult<Option<Device>> {
        let mut inner = self.inner.lock().await;
        if let Some(ip) = &input.ip_address {
            if inner.ip_taken(owner_id, ip, Some(id)) {
                return Err(StoreError::Conflict(OWNER_IP_CONSTRAINT.to_string()));
            }
        }
        let Some(device) = inner
            .devices
            .iter_mut()
            .find(|d| d.id == id && d.owner_id == owner_id)
        else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            device.name = name.clone();
        }
        if let Some(ip) = &input.ip_address {
            device.ip_address = ip.clone();
        }
        device.updated_at = Utc::now();
        Ok(Some(device.clone()))
    }

    async fn delete_device(&self, owner_id: DbId, id: DbId) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        let before = inner.devices.len();
        inner.devices.retain(|d| !(d.id == id && d.owner_id == owner_id));
        if inner.devices.len() == before {
            return Ok(false);
        }
        let orphaned: Vec<DbId> = inner
            .reports
            .iter()
            .filter(|r| r.device_id == id)
            .map(|r| r.id)
            .collect();
        inner.remove_reports(&orphaned);
        Ok(true)
    }

    async fn upsert_heartbeat(&self, input: &UpsertHeartbeat) -> StoreResult<DeviceHeartbeat> {
        Self::check(&self.fail_heartbeat_writes, "heartbeats")?;
        let row = DeviceHeartbeat {
            device_ip: input.device_ip.clone(),
            last_seen: input.last_seen,
            status: input.status.clone(),
            device_info: input.device_info.clone(),
        };
        self.inner
            .lock()
            .await
            .heartbeats
            .insert(row.device_ip.clone(), row.clone());
        Ok(row)
    }

    async fn touch_heartbeat(&self, input: &TouchHeartbeat) -> StoreResult<DeviceHeartbeat> {
        Self::check(&self.fail_heartbeat_writes, "heartbeats")?;
        let mut inner = self.inner.lock().await;
        let row = inner
            .heartbeats
            .entry(input.device_ip.clone())
            .or_insert_with(|| DeviceHeartbeat {
                device_ip: input.device_ip.clone(),
                last_seen: input.last_seen,
                status: input.status.clone(),
                device_info: serde_json::json!({}),
            });
        row.last_seen = input.last_seen;
        row.status = input.status.clone();
        Ok(row.clone())
    }

    async fn find_heartbeat(&self, device_ip: &str) -> StoreResult<Option<DeviceHeartbeat>> {
        Self::check(&self.fail_heartbeat_reads, "heartbeats")?;
        Ok(self.inner.lock().await.heartbeats.get(device_ip).cloned())
    }

    async fn list_heartbeats(&self, device_ips: &[String]) -> StoreResult<Vec<DeviceHeartbeat>> {
        Self::check(&self.fail_heartbeat_reads, "heartbeats")?;
        let inner = self.inner.lock().await;
        Ok(device_ips
            .iter()
            .filter_map(|ip| inner.heartbeats.get(ip).cloned())
            .collect())
    }

    async fn create_task(&self, input: &CreateTask) -> StoreResult<DeviceTask> {
        let task = DeviceTask {
            id: DbId::new_v4(),
            device_ip: input.device_ip.clone(),
            task_type: input.task_type.clone(),
            file_url: input.file_url.clone(),
            file_name: input.file_name.clone(),
            payload: Some(input.payload.clone()),
            status: TASK_STATUS_PENDING.to_string(),
            created_at: Utc::now(),
            completed_at: None,
        };
        self.inner.lock().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn list_pending_tasks(
        &self,
        device_ip: &str,
        limit: i64,
    ) -> StoreResult<Vec<DeviceTask>> {
        let inner = self.inner.lock().await;
        let mut pending: Vec<DeviceTask> = inner
            .tasks
            .iter()
            .filter(|t| t.device_ip == device_ip && t.status == TASK_STATUS_PENDING)
            .cloned()
            .collect();
        // Stable: equal timestamps keep insertion order.
        pending.sort_by_key(|t| t.created_at);
        pending.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(pending)
    }

    async fn count_pending_tasks(&self, device_ip: &str) -> StoreResult<i64> {
        let inner = self.inner.lock().await;
        let count = inner
            .tasks
            .iter()
            .filter(|t| t.device_ip == device_ip && t.status == TASK_STATUS_PENDING)
            .count();
        Ok(count as i64)
    }

    async fn complete_task(
        &self,
        id: DbId,
        input: &CompleteTask,
    ) -> StoreResult<Option<DeviceTask>> {
        let mut inner = self.inner.lock().await;
        let Some(task) = inner.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.status = input.status.clone();
        task.payload = input.payload.clone();
        task.completed_at = Some(input.completed_at);
        Ok(Some(task.clone()))
    }

    async fn create_report(&self, input: &CreateReport) -> StoreResult<AttendanceReport> {
        let mut inner = self.inner.lock().await;
        if !inner.devices.iter().any(|d| d.id == input.device_id) {
            return Err(StoreError::Unavailable(format!(
                "device {} does not exist",
                input.device_id
            )));
        }
        let report = AttendanceReport {
            id: DbId::new_v4(),
            device_id: input.device_id,
            total_students: input.total_students(),
            present_students: input.present_students,
            absent_students: input.absent_students,
            attendance_rate: input.attendance_rate,
            file_name: input.file_name.clone(),
            exam_date: input.exam_date,
            exam_time: input.exam_time,
            created_at: Utc::now(),
        };
        inner.reports.push(report.clone());
        Ok(report)
    }

    async fn insert_student_records(
        &self,
        report_id: DbId,
        rows: &[CreateStudentRecord],
    ) -> StoreResult<u64> {
        Self::check(&self.fail_student_inserts, "student_attendance")?;
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        inner.students.extend(rows.iter().map(|row| StudentAttendanceRecord {
            id: DbId::new_v4(),
            report_id,
            student_name: row.student_name.clone(),
            status: row.status.clone(),
            created_at: now,
        }));
        Ok(rows.len() as u64)
    }

    async fn find_report(
        &self,
        owner_id: DbId,
        id: DbId,
    ) -> StoreResult<Option<ReportWithDevice>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .reports
            .iter()
            .filter(|r| r.id == id)
            .filter_map(|r| inner.join(r))
            .find(|r| r.owner_id == owner_id))
    }

    async fn list_reports(&self, owner_id: DbId) -> StoreResult<Vec<ReportWithDevice>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .reports
            .iter()
            .rev()
            .filter_map(|r| inner.join(r))
            .filter(|r| r.owner_id == owner_id)
            .collect())
    }

    async fn delete_report(&self, owner_id: DbId, id: DbId) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        let owned = inner
            .reports
            .iter()
            .filter(|r| r.id == id)
            .filter_map(|r| inner.join(r))
            .any(|r| r.owner_id == owner_id);
        if owned {
            inner.remove_reports(&[id]);
        }
        Ok(owned)
    }
}
