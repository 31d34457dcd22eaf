//! HTTP client for the device protocol.
//!
//! Speaks the unauthenticated heartbeat/poll endpoints and downloads the
//! files tasks point at.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AgentError;

/// A task as delivered by `GET /devices/poll`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTask {
    pub id: Uuid,
    pub device_ip: String,
    pub task_type: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HeartbeatBody<'a> {
    device_ip: &'a str,
    status: &'a str,
    device_info: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PollBody {
    tasks: Vec<RemoteTask>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody<'a> {
    task_id: Uuid,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
}

/// Backend client bound to one device IP.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    device_ip: String,
}

impl BackendClient {
    pub fn new(base_url: &str, device_ip: &str, timeout: Duration) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            device_ip: device_ip.to_string(),
        })
    }

    pub fn device_ip(&self) -> &str {
        &self.device_ip
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    /// Tell the backend this device is alive.
    pub async fn heartbeat(&self, device_info: serde_json::Value) -> Result<(), AgentError> {
        let response = self
            .http
            .post(self.url("/devices/heartbeat"))
            .json(&HeartbeatBody {
                device_ip: &self.device_ip,
                status: "online",
                device_info,
            })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Fetch the oldest pending tasks. Also refreshes the heartbeat server-side.
    pub async fn poll(&self) -> Result<Vec<RemoteTask>, AgentError> {
        let response = self
            .http
            .get(self.url("/devices/poll"))
            .query(&[("deviceIp", self.device_ip.as_str())])
            .send()
            .await?;
        let body: PollBody = ensure_success(response).await?.json().await?;
        Ok(body.tasks)
    }

    /// Report the final status of a task.
    pub async fn report(
        &self,
        task_id: Uuid,
        status: &str,
        result: Option<serde_json::Value>,
    ) -> Result<(), AgentError> {
        let response = self
            .http
            .post(self.url("/devices/poll"))
            .json(&StatusBody {
                task_id,
                status,
                result,
            })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Download an absolute URL.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, AgentError> {
        let response = self.http.get(url).send().await?;
        let bytes = ensure_success(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AgentError::Rejected {
        status: status.as_u16(),
        body,
    })
}
