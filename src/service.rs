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

//! # Merge Service
//!
//! The two entry points outer layers build on.
//!
//! - **Synchronous** (dashboard style): [`MxMergeService::preview`],
//!   [`MxMergeService::validate`], [`MxMergeService::process`] and
//!   [`MxMergeService::sample`] take uploaded files directly.
//! - **Asynchronous** (API style): [`MxMergeService::submit`] accepts a
//!   [`MxGenerationRequest`] over a stored template and returns a job id
//!   that [`MxMergeService::status`] polls.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assets::MxAssetSet;
use crate::config::MxConfig;
use crate::convert::MxConverter;
use crate::document::MxTemplate;
use crate::errors::{MxError, Result};
use crate::export::row_identifier;
use crate::ingest::reader::objects_to_set;
use crate::ingest::{MxDataFormat, MxDataPreview, MxDataReader, MxFormatDetector};
use crate::job::{MxJobStatistics, MxJobStatus, MxJobStore, MxRowOutcome};
use crate::orchestrator::{MxBatch, MxBatchOptions, MxBatchOrchestrator, MxBatchResult, MxProgressReceiver};
use crate::record::MxDataSet;
use crate::validator::{self, MxCompatibilityReport};

/// A file handed over by a client.
#[derive(Clone, Debug)]
pub struct MxUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl MxUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        MxUpload {
            name: name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| MxError::validation(format!("not a file: {}", path.display())))?;
        Ok(MxUpload {
            name,
            bytes: std::fs::read(path)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MxOutputFormat {
    Docx,
    Pptx,
    Pdf,
    Md,
    Txt,
}

impl MxOutputFormat {
    fn extension(self) -> &'static str {
        match self {
            MxOutputFormat::Docx => ".docx",
            MxOutputFormat::Pptx => ".pptx",
            MxOutputFormat::Pdf => ".pdf",
            MxOutputFormat::Md => ".md",
            MxOutputFormat::Txt => ".txt",
        }
    }
}

/// Asynchronous generation request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MxGenerationRequest {
    /// Template path relative to the templates directory.
    pub template_path: String,
    pub output_format: MxOutputFormat,
    #[serde(default)]
    pub filename_col: Option<String>,
    #[serde(default)]
    pub group_by_folders: bool,
    pub data: Vec<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MxJobStatusResponse {
    pub job_id: String,
    pub status: MxJobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub statistics: MxJobStatistics,
    pub results: Vec<MxRowOutcome>,
}

/// A sample render: the result archive of the first row.
#[derive(Clone, Debug)]
pub struct MxSample {
    pub identifier: String,
    /// Suggested download name.
    pub file_name: String,
    pub archive: PathBuf,
    pub result: MxBatchResult,
}

pub struct MxMergeService {
    config: MxConfig,
    reader: MxDataReader,
    orchestrator: Arc<MxBatchOrchestrator>,
}

impl MxMergeService {
    pub fn new(config: MxConfig) -> Result<Self> {
        config.validate()?;
        let orchestrator = MxBatchOrchestrator::new(&config, MxJobStore::new());
        Ok(MxMergeService {
            config,
            reader: MxDataReader::new(),
            orchestrator: Arc::new(orchestrator),
        })
    }

    /// Replaces the document converter. Call before the first batch.
    pub fn with_converter(mut self, converter: Arc<dyn MxConverter>) -> Self {
        let jobs = self.orchestrator.jobs().clone();
        self.orchestrator = Arc::new(
            MxBatchOrchestrator::new(&self.config, jobs).with_converter(converter),
        );
        self
    }

    pub fn config(&self) -> &MxConfig {
        &self.config
    }

    pub fn jobs(&self) -> &MxJobStore {
        self.orchestrator.jobs()
    }

    /// Removes expired jobs and their files in the background.
    pub fn start_janitor(&self) -> tokio::task::JoinHandle<()> {
        self.jobs().spawn_janitor(
            Duration::from_secs(self.config.cleanup_interval_secs.max(1)),
            Duration::from_secs(self.config.job_ttl_secs),
        )
    }

    pub fn load_data(&self, upload: &MxUpload) -> Result<MxDataSet> {
        let detector = MxFormatDetector::new();
        let format = match detector.detect_from_path(Path::new(&upload.name)) {
            MxDataFormat::Unknown => detector.detect_from_content(&upload.bytes),
            known => known,
        };
        self.reader
            .read_bytes(&upload.bytes, format)
            .map_err(|err| match err {
                MxError::Validation { message } => {
                    MxError::validation(format!("{}: {}", upload.name, message))
                }
                other => other,
            })
    }

    /// Headers and first rows of a data source.
    pub fn preview(&self, data: &MxUpload) -> Result<MxDataPreview> {
        Ok(crate::ingest::reader::preview(&self.load_data(data)?))
    }

    /// Compares the variables of `templates` with the columns of `data`.
    pub fn validate(&self, data: &MxUpload, templates: &[MxUpload]) -> Result<MxCompatibilityReport> {
        let set = self.load_data(data)?;
        let templates = load_templates(templates)?;
        validator::validate(&templates, set.columns())
    }

    /// Starts a batch over every row. Progress is streamed on the returned
    /// receiver; the job id doubles as the session id.
    pub fn process(
        &self,
        data: &MxUpload,
        templates: &[MxUpload],
        assets: Option<&MxUpload>,
        identifier_column: Option<&str>,
        options: MxBatchOptions,
    ) -> Result<(String, MxProgressReceiver)> {
        let batch = self.batch(data, templates, assets, identifier_column)?;
        self.orchestrator
            .spawn(batch, options, &self.config.sessions_dir())
    }

    /// Renders only the first row and waits for it.
    pub async fn sample(
        &self,
        data: &MxUpload,
        templates: &[MxUpload],
        assets: Option<&MxUpload>,
        identifier_column: Option<&str>,
        options: MxBatchOptions,
    ) -> Result<MxSample> {
        let mut batch = self.batch(data, templates, assets, identifier_column)?;
        batch.rows.truncate(1);
        let identifier = batch
            .rows
            .first()
            .map(|row| row_identifier(row, identifier_column))
            .ok_or_else(|| MxError::validation("data source has no rows"))?;
        let job_id = self.jobs().create()?;
        let work_dir = self.config.sessions_dir().join(&job_id);
        let result = self
            .orchestrator
            .run(&job_id, batch, options, &work_dir, None)
            .await?;
        Ok(MxSample {
            file_name: format!(
                "Merx_Sample_{}_{}.zip",
                identifier,
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            ),
            identifier,
            archive: result.archive.clone(),
            result,
        })
    }

    /// Queues a generation over a stored template and returns the job id.
    pub fn submit(&self, request: MxGenerationRequest) -> Result<String> {
        let template_path = self.stored_template(&request.template_path)?;
        let template = MxTemplate::load(&template_path)?;
        let to_pdf = request.output_format == MxOutputFormat::Pdf;
        if !to_pdf && template.extension() != request.output_format.extension() {
            return Err(MxError::validation(format!(
                "template '{}' cannot produce {} output",
                template.name,
                request.output_format.extension()
            )));
        }
        let set = objects_to_set(request.data)?;
        let batch = MxBatch {
            rows: set.into_rows(),
            templates: vec![template],
            assets: None,
            identifier_column: request.filename_col,
            data_source: Some("request payload".to_string()),
            assets_source: None,
        };
        let options = MxBatchOptions {
            to_pdf,
            group_by_folders: request.group_by_folders,
        };
        let (job_id, _events) = self
            .orchestrator
            .spawn(batch, options, &self.config.jobs_dir())?;
        log::info!("[{}] submitted for {}", job_id, request.template_path);
        Ok(job_id)
    }

    pub fn status(&self, job_id: &str) -> Result<MxJobStatusResponse> {
        let job = self.jobs().get(job_id)?;
        let message = match job.status {
            MxJobStatus::Queued => Some("waiting to start".to_string()),
            MxJobStatus::Running => Some(format!(
                "{}/{} rows processed",
                job.statistics.processed_rows, job.statistics.total_rows
            )),
            MxJobStatus::Completed => None,
            MxJobStatus::Failed => job.error.clone(),
        };
        Ok(MxJobStatusResponse {
            job_id: job.id,
            status: job.status,
            download_path: job.artifact,
            message,
            statistics: job.statistics,
            results: job.outcomes,
        })
    }

    /// Result archive of a completed job.
    pub fn download(&self, job_id: &str) -> Result<PathBuf> {
        let job = self.jobs().get(job_id)?;
        match (job.status, job.artifact) {
            (MxJobStatus::Completed, Some(path)) => Ok(path),
            (status, _) => Err(MxError::validation(format!(
                "job '{}' is {}, no download available",
                job_id, status
            ))),
        }
    }

    fn batch(
        &self,
        data: &MxUpload,
        templates: &[MxUpload],
        assets: Option<&MxUpload>,
        identifier_column: Option<&str>,
    ) -> Result<MxBatch> {
        let set = self.load_data(data)?;
        let assets_set = assets
            .map(|upload| MxAssetSet::from_zip_bytes(&upload.bytes))
            .transpose()?;
        Ok(MxBatch {
            rows: set.into_rows(),
            templates: load_templates(templates)?,
            assets: assets_set,
            identifier_column: identifier_column.map(str::to_string),
            data_source: Some(data.name.clone()),
            assets_source: assets.map(|a| a.name.clone()),
        })
    }

    /// Resolves a template reference inside the templates directory.
    fn stored_template(&self, reference: &str) -> Result<PathBuf> {
        let relative = Path::new(reference);
        if reference.trim().is_empty()
            || !relative.components().all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(MxError::validation(format!("invalid template path '{}'", reference)));
        }
        let path = self.config.templates_dir.join(relative);
        if !path.is_file() {
            return Err(MxError::validation(format!("template not found: {}", reference)));
        }
        Ok(path)
    }
}

fn load_templates(uploads: &[MxUpload]) -> Result<Vec<MxTemplate>> {
    uploads
        .iter()
        .map(|upload| MxTemplate::from_bytes(upload.name.clone(), &upload.bytes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(dir: &Path) -> MxMergeService {
        let mut config = MxConfig::default();
        config.work_dir = dir.join("work");
        config.templates_dir = dir.join("templates");
        MxMergeService::new(config).unwrap()
    }

    #[test]
    fn preview_reads_uploaded_csv() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let data = MxUpload::new("clients.csv", b"name,city\nAda,London\nAlan,Wilmslow\n".to_vec());
        let preview = svc.preview(&data).unwrap();
        assert_eq!(preview.headers, vec!["name", "city"]);
        assert_eq!(preview.total_rows, 2);
    }

    #[test]
    fn validate_reports_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let data = MxUpload::new("d.csv", b"name,email\nAda,a@x.org\n".to_vec());
        let template = MxUpload::new("t.txt", b"{{ name }} / {{ phone }}".to_vec());
        let report = svc.validate(&data, &[template]).unwrap();
        assert!(!report.overall_valid);
        assert_eq!(report.details[0].missing_vars, vec!["phone"]);
    }

    #[test]
    fn stored_templates_stay_inside_their_directory() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        assert!(svc.stored_template("../secret.docx").is_err());
        assert!(svc.stored_template("/etc/passwd").is_err());
        assert!(svc.stored_template("missing.docx").is_err());
    }

    #[test]
    fn unknown_jobs_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        assert!(matches!(svc.status("job_nope"), Err(MxError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn sample_renders_only_the_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let data = MxUpload::new("d.csv", b"name\nAda\nAlan\n".to_vec());
        let template = MxUpload::new("card.txt", b"Hi {{ name }}".to_vec());
        let sample = svc
            .sample(&data, &[template], None, Some("name"), MxBatchOptions::default())
            .await
            .unwrap();
        assert_eq!(sample.identifier, "Ada");
        assert!(sample.file_name.starts_with("Merx_Sample_Ada_"));
        assert_eq!(sample.result.statistics.total_rows, 1);
        let written = std::fs::read_to_string(sample.result.output_dir.join("card - Ada.txt")).unwrap();
        assert_eq!(written, "Hi Ada");
    }

    #[tokio::test]
    async fn submitted_jobs_complete_and_expose_their_archive() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        std::fs::create_dir_all(&svc.config().templates_dir).unwrap();
        std::fs::write(svc.config().templates_dir.join("note.md"), "# {{ title }}\n").unwrap();
        let request: MxGenerationRequest = serde_json::from_value(serde_json::json!({
            "template_path": "note.md",
            "output_format": "md",
            "filename_col": "title",
            "data": [{"title": "Alpha"}, {"title": "Beta"}]
        }))
        .unwrap();
        let job_id = svc.submit(request).unwrap();

        let mut status = svc.status(&job_id).unwrap();
        for _ in 0..200 {
            if status.status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            status = svc.status(&job_id).unwrap();
        }
        assert_eq!(status.status, MxJobStatus::Completed);
        assert_eq!(status.statistics.successful_rows, 2);
        assert!(svc.download(&job_id).unwrap().is_file());
    }
}
