//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Merx.
//! The Merx project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Job State Store
//!
//! Lifecycle records of batch runs. A job moves `queued → running →
//! completed | failed`; terminal jobs accept no further updates. Each job
//! is written by the single orchestrator run that owns it while any number
//! of pollers read it.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::MxPlaceholderFailure;
use crate::errors::{MxError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MxJobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl MxJobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MxJobStatus::Completed | MxJobStatus::Failed)
    }

    fn can_move_to(self, next: MxJobStatus) -> bool {
        matches!(
            (self, next),
            (MxJobStatus::Queued, MxJobStatus::Running)
                | (MxJobStatus::Queued, MxJobStatus::Failed)
                | (MxJobStatus::Running, MxJobStatus::Running)
                | (MxJobStatus::Running, MxJobStatus::Completed)
                | (MxJobStatus::Running, MxJobStatus::Failed)
        )
    }
}

impl fmt::Display for MxJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MxJobStatus::Queued => "queued",
            MxJobStatus::Running => "running",
            MxJobStatus::Completed => "completed",
            MxJobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MxOutcomeStatus {
    Success,
    /// Rendered, but some placeholders could not be honoured.
    Partial,
    Failed,
}

impl fmt::Display for MxOutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MxOutcomeStatus::Success => "Success",
            MxOutcomeStatus::Partial => "Partial",
            MxOutcomeStatus::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// Result of one template for one row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MxTemplateOutcome {
    pub template: String,
    pub status: MxOutcomeStatus,
    /// Path of the rendered file, relative to the package root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub placeholder_failures: Vec<MxPlaceholderFailure>,
}

/// Per-row record of a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MxRowOutcome {
    /// One-based row number.
    pub row: usize,
    pub identifier: String,
    pub templates: Vec<MxTemplateOutcome>,
}

impl MxRowOutcome {
    /// Worst status over the row's templates.
    pub fn status(&self) -> MxOutcomeStatus {
        let statuses = self.templates.iter().map(|t| t.status);
        if statuses.clone().any(|s| s == MxOutcomeStatus::Failed) {
            MxOutcomeStatus::Failed
        } else if statuses.clone().any(|s| s == MxOutcomeStatus::Partial) {
            MxOutcomeStatus::Partial
        } else {
            MxOutcomeStatus::Success
        }
    }

    pub fn errors(&self) -> Vec<String> {
        self.templates
            .iter()
            .flat_map(|t| {
                let own = t.error.iter().map(move |e| format!("{}: {}", t.template, e));
                let placeholders = t
                    .placeholder_failures
                    .iter()
                    .map(move |p| format!("{}: {}", t.template, p.message));
                own.chain(placeholders)
            })
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxJobStatistics {
    pub total_rows: usize,
    pub processed_rows: usize,
    pub successful_rows: usize,
    pub partial_rows: usize,
    pub failed_rows: usize,
}

impl MxJobStatistics {
    pub fn success_rate(&self) -> f64 {
        if self.processed_rows == 0 {
            return 0.0;
        }
        self.successful_rows as f64 / self.processed_rows as f64
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MxRenderJob {
    pub id: String,
    pub status: MxJobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub statistics: MxJobStatistics,
    pub outcomes: Vec<MxRowOutcome>,
    /// Result archive, once completed.
    pub artifact: Option<PathBuf>,
    /// Scratch directory removed together with the job.
    pub work_dir: Option<PathBuf>,
    pub error: Option<String>,
}

impl MxRenderJob {
    fn new(id: String) -> Self {
        let now = Utc::now();
        MxRenderJob {
            id,
            status: MxJobStatus::Queued,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
            statistics: MxJobStatistics::default(),
            outcomes: Vec::new(),
            artifact: None,
            work_dir: None,
            error: None,
        }
    }
}

/// A change applied to one job.
#[derive(Clone, Debug)]
pub enum MxJobUpdate {
    WorkDir(PathBuf),
    Start { total_rows: usize },
    RowFinished(MxRowOutcome),
    Complete { artifact: PathBuf },
    Fail { reason: String },
}

impl MxJobUpdate {
    fn target(&self, current: MxJobStatus) -> MxJobStatus {
        match self {
            MxJobUpdate::WorkDir(_) => current,
            MxJobUpdate::Start { .. } | MxJobUpdate::RowFinished(_) => MxJobStatus::Running,
            MxJobUpdate::Complete { .. } => MxJobStatus::Completed,
            MxJobUpdate::Fail { .. } => MxJobStatus::Failed,
        }
    }
}

/// Generates `job_<32 hex digits>`.
pub fn new_job_id() -> String {
    let bytes: [u8; 16] = rand::random();
    format!("job_{}", hex::encode(bytes))
}

#[derive(Clone, Debug, Default)]
pub struct MxJobStore {
    jobs: Arc<RwLock<HashMap<String, MxRenderJob>>>,
}

impl MxJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a queued job and returns its id.
    pub fn create(&self) -> Result<String> {
        let id = new_job_id();
        self.write()?.insert(id.clone(), MxRenderJob::new(id.clone()));
        log::debug!("[{}] queued", id);
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<MxRenderJob> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| MxError::JobNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.read().map(|jobs| jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies `update`, rejecting any move out of a terminal state or
    /// backwards in the lifecycle. Returns the resulting status.
    pub fn update(&self, id: &str, update: MxJobUpdate) -> Result<MxJobStatus> {
        let mut jobs = self.write()?;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| MxError::JobNotFound(id.to_string()))?;
        let next = update.target(job.status);
        let allowed = match update {
            MxJobUpdate::WorkDir(_) => !job.status.is_terminal(),
            MxJobUpdate::RowFinished(_) => job.status == MxJobStatus::Running,
            _ => job.status.can_move_to(next),
        };
        if !allowed {
            return Err(MxError::InvalidTransition {
                job_id: id.to_string(),
                from: job.status.to_string(),
                to: next.to_string(),
            });
        }
        let now = Utc::now();
        match update {
            MxJobUpdate::WorkDir(dir) => job.work_dir = Some(dir),
            MxJobUpdate::Start { total_rows } => {
                job.statistics.total_rows = total_rows;
                job.started_at.get_or_insert(now);
            }
            MxJobUpdate::RowFinished(outcome) => {
                let stats = &mut job.statistics;
                stats.processed_rows += 1;
                match outcome.status() {
                    MxOutcomeStatus::Success => stats.successful_rows += 1,
                    MxOutcomeStatus::Partial => stats.partial_rows += 1,
                    MxOutcomeStatus::Failed => stats.failed_rows += 1,
                }
                job.outcomes.push(outcome);
            }
            MxJobUpdate::Complete { artifact } => {
                job.artifact = Some(artifact);
                job.finished_at = Some(now);
            }
            MxJobUpdate::Fail { reason } => {
                log::error!("[{}] failed: {}", id, reason);
                job.error = Some(reason);
                job.finished_at = Some(now);
            }
        }
        job.status = next;
        job.updated_at = now;
        Ok(next)
    }

    /// Removes terminal jobs finished more than `ttl` ago and returns them.
    pub fn purge_expired(&self, ttl: Duration) -> Result<Vec<MxRenderJob>> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        let cutoff = Utc::now().checked_sub_signed(ttl);
        let mut jobs = self.write()?;
        let expired: Vec<String> = jobs
            .values()
            .filter(|job| match (job.finished_at, cutoff) {
                (Some(done), Some(cutoff)) => job.status.is_terminal() && done <= cutoff,
                _ => false,
            })
            .map(|job| job.id.clone())
            .collect();
        Ok(expired
            .into_iter()
            .filter_map(|id| jobs.remove(&id))
            .collect())
    }

    /// Purges expired jobs and their work directories every `interval`.
    pub fn spawn_janitor(&self, interval: Duration, ttl: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let expired = match store.purge_expired(ttl) {
                    Ok(expired) => expired,
                    Err(err) => {
                        log::error!("job cleanup failed: {}", err);
                        continue;
                    }
                };
                for job in expired {
                    if let Some(dir) = &job.work_dir {
                        if let Err(err) = tokio::fs::remove_dir_all(dir).await {
                            log::warn!("[{}] cannot remove {}: {}", job.id, dir.display(), err);
                        }
                    }
                    log::info!("[{}] expired", job.id);
                }
            }
        })
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, MxRenderJob>>> {
        self.jobs
            .read()
            .map_err(|_| MxError::internal("job store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, MxRenderJob>>> {
        self.jobs
            .write()
            .map_err(|_| MxError::internal("job store lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(row: usize, status: MxOutcomeStatus) -> MxRowOutcome {
        MxRowOutcome {
            row,
            identifier: format!("r{}", row),
            templates: vec![MxTemplateOutcome {
                template: "t.docx".into(),
                status,
                output: None,
                pdf: None,
                error: None,
                placeholder_failures: Vec::new(),
            }],
        }
    }

    #[test]
    fn ids_are_prefixed_hex() {
        let id = new_job_id();
        assert!(id.starts_with("job_"));
        assert_eq!(id.len(), 4 + 32);
        assert_ne!(id, new_job_id());
    }

    #[test]
    fn counts_follow_row_outcomes() {
        let store = MxJobStore::new();
        let id = store.create().unwrap();
        store.update(&id, MxJobUpdate::Start { total_rows: 3 }).unwrap();
        store.update(&id, MxJobUpdate::RowFinished(outcome(1, MxOutcomeStatus::Success))).unwrap();
        store.update(&id, MxJobUpdate::RowFinished(outcome(2, MxOutcomeStatus::Failed))).unwrap();
        store.update(&id, MxJobUpdate::RowFinished(outcome(3, MxOutcomeStatus::Partial))).unwrap();
        let job = store.get(&id).unwrap();
        assert_eq!(job.statistics.processed_rows, 3);
        assert_eq!(job.statistics.failed_rows, 1);
        assert_eq!(job.statistics.partial_rows, 1);
        assert!(job.started_at.is_some());
    }

    #[test]
    fn rows_need_a_running_job() {
        let store = MxJobStore::new();
        let id = store.create().unwrap();
        let err = store
            .update(&id, MxJobUpdate::RowFinished(outcome(1, MxOutcomeStatus::Success)))
            .unwrap_err();
        assert!(matches!(err, MxError::InvalidTransition { .. }));
    }

    #[test]
    fn purge_keeps_active_jobs() {
        let store = MxJobStore::new();
        let done = store.create().unwrap();
        let active = store.create().unwrap();
        store.update(&done, MxJobUpdate::Fail { reason: "x".into() }).unwrap();
        let purged = store.purge_expired(Duration::ZERO).unwrap();
        assert_eq!(purged.len(), 1);
        assert_eq!(purged[0].id, done);
        assert!(store.get(&active).is_ok());
        assert!(matches!(store.get(&done), Err(MxError::JobNotFound(_))));
    }
}
