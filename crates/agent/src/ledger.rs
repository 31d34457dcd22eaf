//! Local record of what the agent has done for each task.
//!
//! The backend redelivers a task on every poll until a status report for it
//! lands, so the agent must tolerate seeing the same task many times. The
//! ledger tracks progress per task id on an [`OptimisticMap`]:
//!
//! - a finished download is recorded and confirmed at once, so the file is
//!   never fetched twice;
//! - a status report is applied tentatively, then confirmed when the backend
//!   accepts it or rolled back when it does not, so the next redelivery
//!   retries only the report;
//! - a reported task the backend no longer delivers is forgotten.

use std::path::PathBuf;

use examhall_core::error::CoreError;
use examhall_core::optimistic::{MutationId, OptimisticMap};
use uuid::Uuid;

/// How far the agent got with a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskProgress {
    /// The task's file is on disk.
    Downloaded { path: PathBuf },
    /// A final status has been sent.
    Reported { status: String },
}

/// What to do with a delivered task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// Never seen: run the task.
    Execute,
    /// Already executed; only the completion report is outstanding.
    ReportCompleted { path: PathBuf },
    /// Already reported, or a report is in flight.
    Skip,
}

/// A status report awaiting the backend's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct PendingReport(MutationId);

#[derive(Debug, Default)]
pub struct TaskLedger {
    tasks: OptimisticMap<Uuid, TaskProgress>,
}

impl TaskLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self, task_id: Uuid) -> Option<&TaskProgress> {
        self.tasks.get(&task_id)
    }

    pub fn next_step(&self, task_id: Uuid) -> NextStep {
        if self.tasks.is_pending(&task_id) {
            return NextStep::Skip;
        }
        match self.tasks.get(&task_id) {
            None => NextStep::Execute,
            Some(TaskProgress::Downloaded { path }) => NextStep::ReportCompleted { path: path.clone() },
            Some(TaskProgress::Reported { .. }) => NextStep::Skip,
        }
    }

    /// Record a finished download. Not subject to rollback.
    pub fn record_download(&mut self, task_id: Uuid, path: PathBuf) -> Result<(), CoreError> {
        let id = self
            .tasks
            .apply(task_id, Some(TaskProgress::Downloaded { path }))?;
        self.tasks.confirm(id)?;
        self.tasks.prune_resolved();
        Ok(())
    }

    /// Tentatively mark `task_id` as reported with `status`.
    pub fn begin_report(&mut self, task_id: Uuid, status: &str) -> Result<PendingReport, CoreError> {
        let id = self.tasks.apply(
            task_id,
            Some(TaskProgress::Reported {
                status: status.to_string(),
            }),
        )?;
        Ok(PendingReport(id))
    }

    /// The backend accepted the report.
    pub fn report_accepted(&mut self, report: PendingReport) -> Result<(), CoreError> {
        self.tasks.confirm(report.0)?;
        self.tasks.prune_resolved();
        Ok(())
    }

    /// Forget reported tasks that are absent from the latest poll.
    ///
    /// A task whose report was accepted is no longer pending server-side, so
    /// it will not be delivered again. Downloads still awaiting a report are
    /// kept: a poll returns only the oldest few tasks.
    pub fn forget_settled(&mut self, delivered: &[Uuid]) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|id, progress| {
            delivered.contains(id) || !matches!(progress, TaskProgress::Reported { .. })
        });
        before - self.tasks.len()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The report did not reach the backend; restore the prior progress.
    pub fn report_failed(&mut self, report: PendingReport) -> Result<(), CoreError> {
        self.tasks.roll_back(report.0)?;
        self.tasks.prune_resolved();
        Ok(())
    }
}
