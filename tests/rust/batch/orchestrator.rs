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

//! # Merx Batch Tests
//!
//! End-to-end batches with in-memory templates and fake converters, plus
//! the job lifecycle rules of the store.

#[path = "../common/mod.rs"]
mod common;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use merx::convert::pdf_path;
use merx::export::{MANIFEST_FILE, REPORT_FILE};
use merx::{
    MxBatch, MxBatchOptions, MxBatchOrchestrator, MxConfig, MxConfigBuilder, MxConversionGate,
    MxConverter, MxError, MxJobStatus, MxJobStore, MxJobUpdate, MxOutcomeStatus, MxProgressEvent,
    MxRowOutcome, Result,
};

use common::{docx_template, paragraph_texts, row};

/// Writes a fake PDF next to the input.
struct InstantPdf;

#[async_trait]
impl MxConverter for InstantPdf {
    async fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        let out = pdf_path(input, out_dir);
        tokio::fs::write(&out, b"%PDF-1.4").await?;
        Ok(out)
    }
}

/// Never finishes within any reasonable deadline.
struct Hung;

#[async_trait]
impl MxConverter for Hung {
    async fn convert(&self, _: &Path, _: &Path) -> Result<PathBuf> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(MxError::internal("unreachable"))
    }
}

fn config(work_dir: &Path) -> MxConfig {
    MxConfigBuilder::new()
        .work_dir(work_dir)
        .render_workers(2)
        .build()
        .unwrap()
}

fn contracts() -> MxBatch {
    MxBatch {
        rows: vec![
            row(0, &[("company", "ACME"), ("total", "100")]),
            row(1, &[("company", "Broken"), ("total", "bad\u{1}value")]),
            row(2, &[("company", "Beta/Labs"), ("total", "250,5")]),
        ],
        templates: vec![docx_template(
            "Contract.docx",
            &[&["{{ company }} owes {{ total | format_currency() }}"]],
        )],
        identifier_column: Some("company".to_string()),
        data_source: Some("clients.csv".to_string()),
        ..MxBatch::default()
    }
}

async fn run_batch(
    orchestrator: &MxBatchOrchestrator,
    batch: MxBatch,
    options: MxBatchOptions,
    work_dir: &Path,
) -> merx::orchestrator::MxBatchResult {
    let job_id = orchestrator.jobs().create().unwrap();
    orchestrator
        .run(&job_id, batch, options, work_dir, None)
        .await
        .unwrap()
}

fn archive_names(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

fn report_lines(output_dir: &Path) -> Vec<String> {
    let mut text = String::new();
    std::fs::File::open(output_dir.join(REPORT_FILE))
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    text.lines().map(str::to_string).collect()
}

/// A failing row is reported and the others are still produced.
#[tokio::test]
async fn test_failed_row_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = MxBatchOrchestrator::new(&config(dir.path()), MxJobStore::new());
    let result = run_batch(&orchestrator, contracts(), MxBatchOptions::default(), dir.path()).await;

    assert_eq!(result.statistics.total_rows, 3);
    assert_eq!(result.statistics.successful_rows, 2);
    assert_eq!(result.statistics.failed_rows, 1);
    let rows: Vec<usize> = result.outcomes.iter().map(|o| o.row).collect();
    assert_eq!(rows, vec![1, 2, 3]);
    assert_eq!(result.failed_rows()[0].identifier, "Broken");

    assert_eq!(
        archive_names(&result.archive),
        vec![
            "Contract - ACME.docx".to_string(),
            "Contract - BetaLabs.docx".to_string(),
            REPORT_FILE.to_string(),
            MANIFEST_FILE.to_string(),
        ]
    );

    let report = report_lines(&result.output_dir);
    assert_eq!(report[0], "Row,Identifier,Output File,Status,Error Details");
    assert!(report[1].starts_with("1,ACME,Contract - ACME.docx,Success"));
    assert!(report[2].starts_with("2,Broken,Contract.docx,Failed,"));
    assert_eq!(report.len(), 4);

    let manifest = merx::export::MxManifest::from_json(
        &std::fs::read_to_string(result.output_dir.join(MANIFEST_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest.job_id, result.job_id);
    assert_eq!(manifest.files.len(), 3);
    assert_eq!(manifest.input.data_source.as_deref(), Some("clients.csv"));
}

#[tokio::test]
async fn test_grouped_layout_uses_identifier_folders() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = MxBatchOrchestrator::new(&config(dir.path()), MxJobStore::new());
    let options = MxBatchOptions {
        to_pdf: false,
        group_by_folders: true,
    };
    let result = run_batch(&orchestrator, contracts(), options, dir.path()).await;
    assert!(result.output_dir.join("ACME").join("Contract - ACME.docx").is_file());
    let first: &MxRowOutcome = &result.outcomes[0];
    assert_eq!(first.templates[0].output.as_deref(), Some("ACME/Contract - ACME.docx"));
}

/// One template failing for a row leaves the row's other templates
/// rendered, written and packaged.
#[tokio::test]
async fn test_failing_template_leaves_siblings_intact() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = MxBatchOrchestrator::new(&config(dir.path()), MxJobStore::new());
    let batch = MxBatch {
        rows: vec![row(
            0,
            &[
                ("id", "A"),
                ("v", "ok"),
                ("bad", "x\u{1}"),
                ("when", "2025-01-15"),
                ("big", "1000000000000000"),
            ],
        )],
        templates: vec![
            docx_template(
                "Good.docx",
                &[
                    &["{{ v }}"],
                    &["{{ when | format_date('fmt', '%Y %z') }}"],
                    &["{{ big | format_number('spell_out') }}"],
                    &["{{ when | format_date('add_days', '999999999999999') }}"],
                ],
            ),
            docx_template("Bad.docx", &[&["{{ bad }}"]]),
        ],
        identifier_column: Some("id".to_string()),
        ..MxBatch::default()
    };
    let result = run_batch(&orchestrator, batch, MxBatchOptions::default(), dir.path()).await;

    let templates = &result.outcomes[0].templates;
    assert_eq!(templates[0].template, "Good.docx");
    assert_eq!(templates[0].status, MxOutcomeStatus::Success);
    assert_eq!(templates[1].template, "Bad.docx");
    assert_eq!(templates[1].status, MxOutcomeStatus::Failed);
    assert!(!templates[1].error.as_deref().unwrap_or_default().contains("aborted"));

    let good = std::fs::read(result.output_dir.join("Good - A.docx")).unwrap();
    assert_eq!(
        paragraph_texts("Good - A.docx", &good),
        vec!["ok", "2025-01-15", "mil trilhões", "2025-01-15"]
    );
    assert!(!result.output_dir.join("Bad - A.docx").exists());
    assert!(archive_names(&result.archive).contains(&"Good - A.docx".to_string()));
}

/// Dot-only identifiers cannot place output outside the result folder.
#[tokio::test]
async fn test_dot_identifiers_stay_inside_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = MxBatchOrchestrator::new(&config(dir.path()), MxJobStore::new());
    let batch = MxBatch {
        rows: vec![
            row(0, &[("company", ".."), ("total", "1")]),
            row(1, &[("company", "."), ("total", "2")]),
        ],
        ..contracts()
    };
    let options = MxBatchOptions {
        to_pdf: false,
        group_by_folders: true,
    };
    let result = run_batch(&orchestrator, batch, options, dir.path()).await;
    let outputs: Vec<Option<&str>> = result
        .outcomes
        .iter()
        .map(|o| o.templates[0].output.as_deref())
        .collect();
    assert_eq!(
        outputs,
        vec![Some("Row_1/Contract - Row_1.docx"), Some("Row_2/Contract - Row_2.docx")]
    );
    let names = archive_names(&result.archive);
    assert!(names.contains(&"Row_1/Contract - Row_1.docx".to_string()));
    assert!(names.contains(&"Row_2/Contract - Row_2.docx".to_string()));
}

#[tokio::test]
async fn test_pdf_outputs_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = MxBatchOrchestrator::new(&config(dir.path()), MxJobStore::new())
        .with_converter(Arc::new(InstantPdf));
    let options = MxBatchOptions {
        to_pdf: true,
        group_by_folders: false,
    };
    let result = run_batch(&orchestrator, contracts(), options, dir.path()).await;
    let acme = &result.outcomes[0].templates[0];
    assert_eq!(acme.status, MxOutcomeStatus::Success);
    assert_eq!(acme.pdf.as_deref(), Some("Contract - ACME.pdf"));
    let report = report_lines(&result.output_dir);
    assert!(report.contains(&"1,ACME,Contract - ACME.pdf,Success,".to_string()));
}

/// A conversion past its deadline fails the template but keeps the
/// rendered document.
#[tokio::test]
async fn test_conversion_timeout_keeps_document() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = MxBatchOrchestrator::new(&config(dir.path()), MxJobStore::new())
        .with_converter(Arc::new(Hung))
        .with_gate(MxConversionGate::new(1, Duration::from_millis(50)));
    let batch = MxBatch {
        rows: vec![row(0, &[("company", "ACME"), ("total", "1")])],
        ..contracts()
    };
    let options = MxBatchOptions {
        to_pdf: true,
        group_by_folders: false,
    };
    let result = run_batch(&orchestrator, batch, options, dir.path()).await;
    let outcome = &result.outcomes[0].templates[0];
    assert_eq!(outcome.status, MxOutcomeStatus::Failed);
    assert!(outcome.error.as_deref().unwrap_or_default().starts_with("PDF conversion:"));
    assert!(result.output_dir.join("Contract - ACME.docx").is_file());
    assert_eq!(result.statistics.failed_rows, 1);
}

/// The completion sentinel is the last event of a spawned batch.
#[tokio::test]
async fn test_spawned_batch_ends_with_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = MxJobStore::new();
    let orchestrator = Arc::new(MxBatchOrchestrator::new(&config(dir.path()), jobs.clone()));
    let (job_id, mut events) = orchestrator
        .spawn(contracts(), MxBatchOptions::default(), dir.path())
        .unwrap();

    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        seen.push(event);
    }
    assert_eq!(seen.last(), Some(&MxProgressEvent::Complete));
    assert_eq!(seen.iter().filter(|e| e.is_terminal()).count(), 1);

    let job = jobs.get(&job_id).unwrap();
    assert_eq!(job.status, MxJobStatus::Completed);
    assert_eq!(job.work_dir, Some(dir.path().join(&job_id)));
    assert!(job.artifact.map(|p| p.is_file()).unwrap_or(false));
}

#[test]
fn test_job_status_never_moves_backwards() {
    let jobs = MxJobStore::new();
    let id = jobs.create().unwrap();
    assert_eq!(jobs.get(&id).unwrap().status, MxJobStatus::Queued);

    let early = jobs.update(&id, MxJobUpdate::RowFinished(MxRowOutcome {
        row: 1,
        identifier: "Row_1".into(),
        templates: Vec::new(),
    }));
    assert!(matches!(early, Err(MxError::InvalidTransition { .. })));

    assert_eq!(
        jobs.update(&id, MxJobUpdate::Start { total_rows: 1 }).unwrap(),
        MxJobStatus::Running
    );
    assert_eq!(
        jobs.update(&id, MxJobUpdate::Complete { artifact: PathBuf::from("out.zip") }).unwrap(),
        MxJobStatus::Completed
    );
    for update in [
        MxJobUpdate::Start { total_rows: 1 },
        MxJobUpdate::Fail { reason: "late".into() },
    ] {
        assert!(matches!(jobs.update(&id, update), Err(MxError::InvalidTransition { .. })));
    }
    assert!(matches!(jobs.get("job_missing"), Err(MxError::JobNotFound(_))));
}
