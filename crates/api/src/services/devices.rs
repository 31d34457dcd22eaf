//! Owner-scoped device management and exam-file scheduling.

use examhall_core::devices::{validate_device_name, validate_ip_address};
use examhall_core::error::CoreError;
use examhall_core::exam_schedule::{local_date, parse_exam_window, scheduled_file_name};
use examhall_core::task_queue::TASK_TYPE_UPLOAD_FILE;
use examhall_core::types::{DbId, Timestamp};
use examhall_db::models::device::{CreateDevice, Device, UpdateDevice};
use examhall_db::models::task::DeviceTask;
use examhall_db::FleetStore;
use serde::Serialize;

use crate::error::AppResult;
use crate::services::files::store_upload;
use crate::services::liveness::get_statuses;
use crate::services::tasks::{enqueue, EnqueueTask};
use crate::storage::ObjectStore;

/// A device with its current liveness.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceWithStatus {
    #[serde(flatten)]
    pub device: Device,
    pub online: bool,
}

fn normalize_create(input: CreateDevice) -> Result<CreateDevice, CoreError> {
    let name = input.name.trim().to_string();
    let ip_address = input.ip_address.trim().to_string();
    validate_device_name(&name)?;
    validate_ip_address(&ip_address)?;
    Ok(CreateDevice { name, ip_address })
}

fn normalize_update(input: UpdateDevice) -> Result<UpdateDevice, CoreError> {
    let name = input.name.map(|n| n.trim().to_string());
    let ip_address = input.ip_address.map(|ip| ip.trim().to_string());
    if let Some(name) = &name {
        validate_device_name(name)?;
    }
    if let Some(ip) = &ip_address {
        validate_ip_address(ip)?;
    }
    Ok(UpdateDevice { name, ip_address })
}

async fn owned_device(store: &dyn FleetStore, owner_id: DbId, id: DbId) -> AppResult<Device> {
    Ok(store
        .find_device(owner_id, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Device", id))?)
}

/// The caller's devices, newest first, each with its online flag.
pub async fn list(
    store: &dyn FleetStore,
    owner_id: DbId,
    now: Timestamp,
) -> AppResult<Vec<DeviceWithStatus>> {
    let devices = store.list_devices(owner_id).await?;
    let ips: Vec<String> = devices.iter().map(|d| d.ip_address.clone()).collect();
    let statuses = get_statuses(store, &ips, now).await;

    Ok(devices
        .into_iter()
        .map(|device| {
            let online = statuses.get(&device.ip_address).copied().unwrap_or(false);
            DeviceWithStatus { device, online }
        })
        .collect())
}

pub async fn get(
    store: &dyn FleetStore,
    owner_id: DbId,
    id: DbId,
    now: Timestamp,
) -> AppResult<DeviceWithStatus> {
    let device = owned_device(store, owner_id, id).await?;
    let online = crate::services::liveness::is_online(store, &device.ip_address, now).await;
    Ok(DeviceWithStatus { device, online })
}

pub async fn create(
    store: &dyn FleetStore,
    owner_id: DbId,
    input: CreateDevice,
) -> AppResult<Device> {
    let input = normalize_create(input)?;
    let device = store.create_device(owner_id, &input).await?;
    tracing::info!(device_id = %device.id, device_ip = %device.ip_address, owner_id = %owner_id, "Device registered");
    Ok(device)
}

pub async fn update(
    store: &dyn FleetStore,
    owner_id: DbId,
    id: DbId,
    input: UpdateDevice,
) -> AppResult<Device> {
    let input = normalize_update(input)?;
    let device = store
        .update_device(owner_id, id, &input)
        .await?
        .ok_or_else(|| CoreError::not_found("Device", id))?;
    tracing::info!(device_id = %device.id, owner_id = %owner_id, "Device updated");
    Ok(device)
}

/// Delete a device. Its reports go with it; tasks and heartbeats keyed by
/// its IP are left alone.
pub async fn delete(store: &dyn FleetStore, owner_id: DbId, id: DbId) -> AppResult<()> {
    if !store.delete_device(owner_id, id).await? {
        return Err(CoreError::not_found("Device", id).into());
    }
    tracing::info!(device_id = %id, owner_id = %owner_id, "Device deleted");
    Ok(())
}

/// `{ip: online}` for every device the caller owns.
pub async fn statuses(
    store: &dyn FleetStore,
    owner_id: DbId,
    now: Timestamp,
) -> AppResult<std::collections::BTreeMap<String, bool>> {
    let ips: Vec<String> = store
        .list_devices(owner_id)
        .await?
        .into_iter()
        .map(|d| d.ip_address)
        .collect();
    Ok(get_statuses(store, &ips, now).await)
}

/// An exam file to deliver to a device, with the window recognition runs in.
#[derive(Debug, Clone)]
pub struct ExamFileUpload {
    pub original_name: String,
    pub bytes: Vec<u8>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Store an exam file under its scheduled name and queue an `upload_file`
/// task telling the device to fetch it.
pub async fn schedule_exam_file(
    store: &dyn FleetStore,
    objects: &dyn ObjectStore,
    owner_id: DbId,
    device_id: DbId,
    upload: ExamFileUpload,
    now: Timestamp,
) -> AppResult<DeviceTask> {
    let device = owned_device(store, owner_id, device_id).await?;
    let start = upload.start_time.unwrap_or_default();
    let end = upload.end_time.unwrap_or_default();
    let window = parse_exam_window(&start, &end)?;

    let scheduled_name = scheduled_file_name(&upload.original_name, local_date(now), &window);
    let stored = store_upload(objects, owner_id, &scheduled_name, &upload.bytes, now).await?;

    enqueue(
        store,
        owner_id,
        EnqueueTask {
            device_ip: Some(device.ip_address),
            task_type: Some(TASK_TYPE_UPLOAD_FILE.to_string()),
            file_url: Some(stored.file_url),
            file_name: Some(scheduled_name),
            payload: Some(serde_json::json!({
                "startTime": start.trim(),
                "endTime": end.trim(),
                "originalFileName": upload.original_name,
            })),
        },
    )
    .await
}
