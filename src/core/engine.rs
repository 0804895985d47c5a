use std::time::Duration;

use crate::core::{Pipeline, Platform};
use crate::domain::model::{ExportTask, TaskState};
use crate::utils::error::{ExportError, Result};

pub struct ExportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ExportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Resolve the region and reference grid, plan one job per covariate,
    /// and submit everything. Returns the accepted task handles.
    pub async fn run(&self) -> Result<Vec<ExportTask>> {
        tracing::info!("Starting export run");

        tracing::info!("Resolving region and reference projection...");
        let context = self.pipeline.resolve().await?;
        tracing::info!(
            "Region '{}' resolved; exports aligned to {}",
            context.region.name,
            context.projection.crs
        );

        tracing::info!("Planning export jobs...");
        let requests = self.pipeline.plan(&context).await?;
        tracing::info!("Planned {} export jobs", requests.len());

        tracing::info!("Submitting export jobs...");
        let tasks = self.pipeline.submit(requests).await?;
        tracing::info!("Submitted {} export tasks", tasks.len());

        Ok(tasks)
    }
}

/// Poll task status until every task reaches a terminal state or the
/// deadline passes. A failed or cancelled task aborts the watch.
pub async fn watch<P: Platform>(
    platform: &P,
    tasks: Vec<ExportTask>,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<Vec<ExportTask>> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut pending = tasks;
    let mut completed = Vec::new();

    loop {
        let mut still_running = Vec::new();

        for task in pending {
            let latest = platform.export_status(&task.id).await?;
            match latest.state {
                TaskState::Failed | TaskState::Cancelled => {
                    let message = latest
                        .error
                        .unwrap_or_else(|| format!("task ended in state {}", latest.state));
                    return Err(ExportError::TaskFailed {
                        task_id: latest.id,
                        message,
                    });
                }
                TaskState::Completed => {
                    tracing::info!("Task {} completed", latest.id);
                    completed.push(latest);
                }
                TaskState::Pending | TaskState::Running => still_running.push(latest),
            }
        }

        if still_running.is_empty() {
            return Ok(completed);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(ExportError::Timeout {
                minutes: timeout.as_secs() / 60,
            });
        }

        tracing::debug!("{} task(s) still running", still_running.len());
        tokio::time::sleep(poll_interval).await;
        pending = still_running;
    }
}
