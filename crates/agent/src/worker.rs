//! The heartbeat + poll loop and task execution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use examhall_core::files::sanitize_file_name;
use examhall_core::task_queue::{TASK_STATUS_COMPLETED, TASK_STATUS_FAILED, TASK_TYPE_UPLOAD_FILE};
use tokio_util::sync::CancellationToken;

use crate::client::{BackendClient, RemoteTask};
use crate::error::AgentError;
use crate::ledger::{NextStep, TaskLedger};

/// What happened to the tasks delivered by one poll.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub delivered: usize,
    pub reported: usize,
    pub skipped: usize,
}

pub struct Worker {
    client: BackendClient,
    download_dir: PathBuf,
    ledger: TaskLedger,
}

impl Worker {
    pub fn new(client: BackendClient, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            download_dir: download_dir.into(),
            ledger: TaskLedger::new(),
        }
    }

    pub fn ledger(&self) -> &TaskLedger {
        &self.ledger
    }

    /// Run cycles every `interval` until `cancel` fires. Cycle failures are
    /// logged and retried on the next tick.
    pub async fn run(mut self, interval: Duration, cancel: CancellationToken) {
        tracing::info!(
            device_ip = %self.client.device_ip(),
            interval_secs = interval.as_secs(),
            "Task worker started",
        );

        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Task worker stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(summary) if summary.delivered > 0 => {
                            tracing::info!(
                                delivered = summary.delivered,
                                reported = summary.reported,
                                skipped = summary.skipped,
                                "Poll cycle finished",
                            );
                        }
                        Ok(_) => tracing::debug!("No pending tasks"),
                        Err(e) => tracing::warn!(error = %e, "Poll cycle failed"),
                    }
                }
            }
        }
    }

    /// One heartbeat, one poll, then every delivered task in order.
    pub async fn run_cycle(&mut self) -> Result<CycleSummary, AgentError> {
        let device_info = serde_json::json!({ "agentVersion": env!("CARGO_PKG_VERSION") });
        if let Err(e) = self.client.heartbeat(device_info).await {
            // Polling refreshes the heartbeat too; carry on.
            tracing::warn!(error = %e, "Heartbeat failed");
        }

        let tasks = self.client.poll().await?;
        let delivered: Vec<_> = tasks.iter().map(|t| t.id).collect();
        let forgotten = self.ledger.forget_settled(&delivered);
        if forgotten > 0 {
            tracing::debug!(forgotten, "Dropped settled tasks from ledger");
        }

        let mut summary = CycleSummary {
            delivered: tasks.len(),
            ..CycleSummary::default()
        };

        for task in tasks {
            if self.handle(&task).await? {
                summary.reported += 1;
            } else {
                summary.skipped += 1;
            }
        }
        Ok(summary)
    }

    /// Returns whether a status report for `task` was accepted.
    async fn handle(&mut self, task: &RemoteTask) -> Result<bool, AgentError> {
        let (status, result) = match self.ledger.next_step(task.id) {
            NextStep::Skip => {
                tracing::debug!(task_id = %task.id, "Task already handled; skipping");
                return Ok(false);
            }
            NextStep::ReportCompleted { path } => {
                tracing::info!(task_id = %task.id, "Retrying completion report");
                (TASK_STATUS_COMPLETED, completed_result(&path))
            }
            NextStep::Execute => match self.execute(task).await {
                Ok(path) => {
                    self.ledger.record_download(task.id, path.clone())?;
                    (TASK_STATUS_COMPLETED, completed_result(&path))
                }
                Err(e) => {
                    tracing::warn!(task_id = %task.id, task_type = %task.task_type, error = %e, "Task failed");
                    (TASK_STATUS_FAILED, serde_json::Value::String(e.to_string()))
                }
            },
        };

        let pending = self.ledger.begin_report(task.id, status)?;
        match self.client.report(task.id, status, Some(result)).await {
            Ok(()) => {
                self.ledger.report_accepted(pending)?;
                tracing::info!(task_id = %task.id, status, "Task status reported");
                Ok(true)
            }
            Err(e) => {
                self.ledger.report_failed(pending)?;
                tracing::warn!(task_id = %task.id, status, error = %e, "Status report failed; will retry on redelivery");
                Ok(false)
            }
        }
    }

    async fn execute(&self, task: &RemoteTask) -> Result<PathBuf, AgentError> {
        if task.task_type != TASK_TYPE_UPLOAD_FILE {
            return Err(AgentError::InvalidTask(format!(
                "Unsupported task type '{}'",
                task.task_type
            )));
        }
        let url = task
            .file_url
            .as_deref()
            .ok_or_else(|| AgentError::InvalidTask("Task has no file_url".into()))?;
        let file_name = task
            .file_name
            .as_deref()
            .map(sanitize_file_name)
            .ok_or_else(|| AgentError::InvalidTask("Task has no file_name".into()))?;

        let bytes = self.client.download(url).await?;
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let path = self.download_dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(task_id = %task.id, path = %path.display(), size = bytes.len(), "Exam file downloaded");
        Ok(path)
    }
}

fn completed_result(path: &Path) -> serde_json::Value {
    serde_json::json!({ "path": path.display().to_string() })
}
