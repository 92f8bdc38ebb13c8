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

//! # Batch Orchestrator
//!
//! Drives one batch: every row is rendered against every template, each
//! (row, template) pair succeeds or fails on its own, optional PDF
//! conversion goes through the shared [`MxConversionGate`], and the outputs
//! are packaged with a report and a manifest.
//!
//! Rows render in parallel on the blocking pool, bounded by
//! `render_workers`; outcomes are recorded and announced in row order.
//! Progress is pushed on an optional channel whose receiver may go away at
//! any time without affecting the batch. The job record in
//! [`MxJobStore`] is the source of truth for the batch state.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

use crate::assets::MxAssetSet;
use crate::config::MxConfig;
use crate::convert::{MxConversionGate, MxConverter, MxSofficeConverter};
use crate::document::MxTemplate;
use crate::engine::MxMergeEngine;
use crate::errors::{MxError, Result};
use crate::export::{
    output_file_name, row_identifier, write_report, zip_directory, MxInputManifest,
    MxManifestBuilder, MxOutputLayout, REPORT_FILE,
};
use crate::job::{
    MxJobStatistics, MxJobStore, MxJobUpdate, MxOutcomeStatus, MxRowOutcome, MxTemplateOutcome,
};
use crate::record::MxDataRow;

pub const PROCESS_COMPLETE: &str = "PROCESS_COMPLETE";
pub const PROCESS_ERROR: &str = "PROCESS_ERROR";

/// One line of the progress stream. Only the two terminal sentinels are
/// meant to be machine-read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MxProgressEvent {
    Status(String),
    Complete,
    Error(String),
}

impl MxProgressEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MxProgressEvent::Status(_))
    }
}

impl fmt::Display for MxProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MxProgressEvent::Status(line) => f.write_str(line),
            MxProgressEvent::Complete => f.write_str(PROCESS_COMPLETE),
            MxProgressEvent::Error(message) => write!(f, "{}: {}", PROCESS_ERROR, message),
        }
    }
}

pub type MxProgressSender = mpsc::UnboundedSender<MxProgressEvent>;
pub type MxProgressReceiver = mpsc::UnboundedReceiver<MxProgressEvent>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MxBatchOptions {
    pub to_pdf: bool,
    pub group_by_folders: bool,
}

/// Inputs of one batch.
#[derive(Clone, Debug, Default)]
pub struct MxBatch {
    pub rows: Vec<MxDataRow>,
    pub templates: Vec<MxTemplate>,
    pub assets: Option<MxAssetSet>,
    /// Column whose value names the outputs of a row.
    pub identifier_column: Option<String>,
    /// Names of the uploaded inputs, recorded in the manifest.
    pub data_source: Option<String>,
    pub assets_source: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MxBatchResult {
    pub job_id: String,
    pub statistics: MxJobStatistics,
    pub outcomes: Vec<MxRowOutcome>,
    /// Root of the packaged outputs.
    pub output_dir: PathBuf,
    pub archive: PathBuf,
}

impl MxBatchResult {
    /// Rows with at least one failed template.
    pub fn failed_rows(&self) -> Vec<&MxRowOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status() == MxOutcomeStatus::Failed)
            .collect()
    }
}

struct Shared {
    templates: Vec<MxTemplate>,
    assets: Option<MxAssetSet>,
}

pub struct MxBatchOrchestrator {
    engine: Arc<MxMergeEngine>,
    converter: Arc<dyn MxConverter>,
    gate: MxConversionGate,
    jobs: MxJobStore,
    workers: usize,
}

impl MxBatchOrchestrator {
    pub fn new(config: &MxConfig, jobs: MxJobStore) -> Self {
        MxBatchOrchestrator {
            engine: Arc::new(MxMergeEngine::from_config(config)),
            converter: Arc::new(MxSofficeConverter::new(config.conversion.binary.clone())),
            gate: MxConversionGate::from_config(&config.conversion),
            jobs,
            workers: config.render_workers.max(1),
        }
    }

    pub fn with_converter(mut self, converter: Arc<dyn MxConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_gate(mut self, gate: MxConversionGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn jobs(&self) -> &MxJobStore {
        &self.jobs
    }

    /// Starts `batch` as a background task under a new job working in
    /// `work_root/<job id>`. The task outlives the caller; its state is read
    /// back through the job store.
    pub fn spawn(
        self: &Arc<Self>,
        batch: MxBatch,
        options: MxBatchOptions,
        work_root: &Path,
    ) -> Result<(String, MxProgressReceiver)> {
        let job_id = self.jobs.create()?;
        let work_dir = work_root.join(&job_id);
        let (tx, rx) = mpsc::unbounded_channel();
        let this = Arc::clone(self);
        let id = job_id.clone();
        tokio::spawn(async move {
            if let Err(err) = this.run(&id, batch, options, &work_dir, Some(tx)).await {
                log::error!("[{}] batch aborted: {}", id, err);
            }
        });
        Ok((job_id, rx))
    }

    /// Runs `batch` to completion under the already created job `job_id`.
    /// Only orchestrator faults return an error; row failures are recorded
    /// in the outcomes.
    pub async fn run(
        &self,
        job_id: &str,
        batch: MxBatch,
        options: MxBatchOptions,
        work_dir: &Path,
        events: Option<MxProgressSender>,
    ) -> Result<MxBatchResult> {
        let emit = |event: MxProgressEvent| {
            if let Some(tx) = &events {
                let _ = tx.send(event);
            }
        };
        match self.execute(job_id, batch, options, work_dir, &emit).await {
            Ok(result) => {
                self.jobs.update(
                    job_id,
                    MxJobUpdate::Complete {
                        artifact: result.archive.clone(),
                    },
                )?;
                log::info!(
                    "[{}] completed: {}/{} rows succeeded",
                    job_id,
                    result.statistics.successful_rows,
                    result.statistics.total_rows
                );
                emit(MxProgressEvent::Complete);
                Ok(result)
            }
            Err(err) => {
                let reason = err.to_string();
                if let Err(update) = self.jobs.update(job_id, MxJobUpdate::Fail { reason: reason.clone() }) {
                    log::warn!("[{}] cannot record failure: {}", job_id, update);
                }
                emit(MxProgressEvent::Error(reason));
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        job_id: &str,
        batch: MxBatch,
        options: MxBatchOptions,
        work_dir: &Path,
        emit: &(dyn Fn(MxProgressEvent) + Sync),
    ) -> Result<MxBatchResult> {
        if batch.templates.is_empty() {
            return Err(MxError::orchestrator("no templates provided"));
        }
        if batch.rows.is_empty() {
            return Err(MxError::orchestrator("no data rows provided"));
        }
        self.jobs.update(job_id, MxJobUpdate::WorkDir(work_dir.to_path_buf()))?;
        self.jobs.update(
            job_id,
            MxJobUpdate::Start {
                total_rows: batch.rows.len(),
            },
        )?;

        let output_dir = work_dir.join("outputs");
        std::fs::create_dir_all(&output_dir)
            .map_err(|e| MxError::orchestrator(format!("cannot create {}: {}", output_dir.display(), e)))?;

        let input = MxInputManifest {
            data_source: batch.data_source.clone(),
            templates: batch.templates.iter().map(|t| t.name.clone()).collect(),
            assets: batch.assets_source.clone(),
            identifier_column: batch.identifier_column.clone(),
        };
        let total = batch.rows.len();
        log::info!(
            "[{}] rendering {} row(s) x {} template(s)",
            job_id,
            total,
            batch.templates.len()
        );
        emit(MxProgressEvent::Status(format!(
            "Processing {} row(s) with {} template(s)",
            total,
            batch.templates.len()
        )));

        let layout = MxOutputLayout::from_grouping(options.group_by_folders);
        let identifier_column = batch.identifier_column.clone();
        let shared = Arc::new(Shared {
            templates: batch.templates,
            assets: batch.assets,
        });
        let mut rows = stream::iter(batch.rows.into_iter().map(|row| {
            let identifier = row_identifier(&row, identifier_column.as_deref());
            self.process_row(
                row,
                identifier,
                Arc::clone(&shared),
                layout,
                output_dir.clone(),
                options.to_pdf,
            )
        }))
        .buffered(self.workers);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = rows.next().await {
            let line = match outcome.status() {
                MxOutcomeStatus::Success => format!("{} processed", outcome.identifier),
                MxOutcomeStatus::Partial => {
                    format!("{} processed with warnings", outcome.identifier)
                }
                MxOutcomeStatus::Failed => {
                    format!("{} failed: {}", outcome.identifier, outcome.errors().join("; "))
                }
            };
            emit(MxProgressEvent::Status(format!(
                "[{}/{}] {}",
                outcome.row, total, line
            )));
            self.jobs
                .update(job_id, MxJobUpdate::RowFinished(outcome.clone()))?;
            outcomes.push(outcome);
        }
        drop(rows);

        emit(MxProgressEvent::Status("Packaging results".to_string()));
        let statistics = self.jobs.get(job_id)?.statistics;
        write_report(&output_dir.join(REPORT_FILE), &outcomes)
            .map_err(|e| MxError::orchestrator(format!("cannot write report: {}", e)))?;
        MxManifestBuilder::new(job_id)
            .input(input)
            .statistics(statistics.clone())
            .metadata("group_by_folders", &options.group_by_folders.to_string())
            .metadata("to_pdf", &options.to_pdf.to_string())
            .scan_directory(&output_dir)
            .and_then(|builder| builder.build().write_to(&output_dir))
            .map_err(|e| MxError::orchestrator(format!("cannot write manifest: {}", e)))?;
        let archive = work_dir.join(format!("{}_result.zip", job_id));
        zip_directory(&output_dir, &archive)
            .map_err(|e| MxError::orchestrator(format!("cannot package results: {}", e)))?;

        Ok(MxBatchResult {
            job_id: job_id.to_string(),
            statistics,
            outcomes,
            output_dir,
            archive,
        })
    }

    async fn process_row(
        &self,
        row: MxDataRow,
        identifier: String,
        shared: Arc<Shared>,
        layout: MxOutputLayout,
        output_dir: PathBuf,
        to_pdf: bool,
    ) -> MxRowOutcome {
        let row_number = row.index + 1;
        let target_dir = layout.directory(&output_dir, &identifier);
        let engine = Arc::clone(&self.engine);
        let rendered = {
            let identifier = identifier.clone();
            let target_dir = target_dir.clone();
            let shared = Arc::clone(&shared);
            tokio::task::spawn_blocking(move || {
                render_row(&engine, &row, &identifier, &shared, layout, &target_dir)
            })
            .await
        };
        let mut templates = match rendered {
            Ok(templates) => templates,
            Err(join) => shared
                .templates
                .iter()
                .map(|t| failed(&t.name, format!("render task aborted: {}", join)))
                .collect(),
        };

        if to_pdf {
            for outcome in templates
                .iter_mut()
                .filter(|t| t.status != MxOutcomeStatus::Failed)
            {
                self.convert_output(outcome, &identifier, layout, &target_dir)
                    .await;
            }
        }

        MxRowOutcome {
            row: row_number,
            identifier,
            templates,
        }
    }

    /// A failed conversion fails the template outcome but keeps its
    /// rendered file.
    async fn convert_output(
        &self,
        outcome: &mut MxTemplateOutcome,
        identifier: &str,
        layout: MxOutputLayout,
        target_dir: &Path,
    ) {
        let Some(file_name) = outcome
            .output
            .as_deref()
            .and_then(|p| p.rsplit('/').next())
            .map(str::to_string)
        else {
            return;
        };
        let input = target_dir.join(&file_name);
        match self
            .gate
            .convert(self.converter.as_ref(), &input, target_dir)
            .await
        {
            Ok(pdf) => {
                let pdf_name = pdf
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                outcome.pdf = Some(layout.relative(identifier, &pdf_name));
            }
            Err(err) => {
                log::error!("PDF conversion of {} failed: {}", file_name, err);
                outcome.status = MxOutcomeStatus::Failed;
                outcome.error = Some(format!("PDF conversion: {}", err));
            }
        }
    }
}

fn failed(template: &str, message: String) -> MxTemplateOutcome {
    MxTemplateOutcome {
        template: template.to_string(),
        status: MxOutcomeStatus::Failed,
        output: None,
        pdf: None,
        error: Some(message),
        placeholder_failures: Vec::new(),
    }
}

fn render_row(
    engine: &MxMergeEngine,
    row: &MxDataRow,
    identifier: &str,
    shared: &Shared,
    layout: MxOutputLayout,
    target_dir: &Path,
) -> Vec<MxTemplateOutcome> {
    if let Err(err) = std::fs::create_dir_all(target_dir) {
        let message = format!("cannot create {}: {}", target_dir.display(), err);
        return shared
            .templates
            .iter()
            .map(|t| failed(&t.name, message.clone()))
            .collect();
    }
    shared
        .templates
        .iter()
        .map(|template| {
            let file_name = output_file_name(template.stem(), identifier, &template.extension());
            let written = isolated(row.index + 1, &template.name, || {
                engine.render(template, row, shared.assets.as_ref())
            })
            .and_then(|doc| {
                std::fs::write(target_dir.join(&file_name), &doc.bytes)?;
                Ok(doc)
            });
            match written {
                Ok(doc) => MxTemplateOutcome {
                    template: template.name.clone(),
                    status: if doc.failures.is_empty() {
                        MxOutcomeStatus::Success
                    } else {
                        MxOutcomeStatus::Partial
                    },
                    output: Some(layout.relative(identifier, &file_name)),
                    pdf: None,
                    error: None,
                    placeholder_failures: doc.failures,
                },
                Err(err) => {
                    log::error!("error generating {}: {}", file_name, err);
                    failed(&template.name, err.to_string())
                }
            }
        })
        .collect()
}

/// Runs one template's render so that a panic inside it fails only that
/// (row, template) pair.
fn isolated<T>(row: usize, template: &str, render: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(render)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        log::error!("render of {} for row {} panicked: {}", template, row, reason);
        Err(MxError::row_render(row, template, format!("render aborted: {}", reason)))
    })
}
