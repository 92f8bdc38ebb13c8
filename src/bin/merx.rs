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

//! Merx command line.
//!
//! Commands: preview, validate, render. Reports go to stdout as JSON;
//! `render` prints progress lines while the batch runs. `validate` exits
//! non-zero when a template references missing columns.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use merx::ingest::reader::preview;
use merx::{
    logging, validator, MxAssetSet, MxBatch, MxBatchOptions, MxBatchOrchestrator, MxConfig,
    MxDataReader, MxJobStore, MxTemplate,
};

#[derive(Parser)]
#[command(name = "merx")]
#[command(version, about = "Merx - batch document merge engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (.json, .yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the headers and first rows of a data source
    Preview {
        data: PathBuf,
    },

    /// Check that every template variable has a data column
    Validate {
        data: PathBuf,
        #[arg(required = true)]
        templates: Vec<PathBuf>,
    },

    /// Render every row against every template
    Render {
        data: PathBuf,
        #[arg(required = true)]
        templates: Vec<PathBuf>,

        /// Column naming the outputs of each row
        #[arg(long)]
        id_column: Option<String>,

        /// Image assets, as a .zip archive or a directory
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Also convert outputs to PDF
        #[arg(long)]
        pdf: bool,

        /// One folder per row identifier
        #[arg(long)]
        group: bool,

        /// Output directory
        #[arg(short, long, default_value = "merx-output")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => MxConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => MxConfig::default(),
    }
    .apply_env();
    logging::init(&config);

    match cli.command {
        Commands::Preview { data } => {
            let set = MxDataReader::new().read_path(&data)?;
            println!("{}", serde_json::to_string_pretty(&preview(&set))?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { data, templates } => {
            let set = MxDataReader::new().read_path(&data)?;
            let templates = load_templates(&templates)?;
            let report = validator::validate(&templates, set.columns())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.overall_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Render {
            data,
            templates,
            id_column,
            assets,
            pdf,
            group,
            out,
        } => {
            let set = MxDataReader::new().read_path(&data)?;
            let batch = MxBatch {
                rows: set.into_rows(),
                templates: load_templates(&templates)?,
                assets: assets.as_deref().map(MxAssetSet::load).transpose()?,
                identifier_column: id_column,
                data_source: file_name(&data),
                assets_source: assets.as_deref().and_then(file_name),
            };
            let options = MxBatchOptions {
                to_pdf: pdf,
                group_by_folders: group,
            };
            let jobs = MxJobStore::new();
            let orchestrator = MxBatchOrchestrator::new(&config, jobs.clone());
            let job_id = jobs.create()?;

            let (tx, mut rx) = mpsc::unbounded_channel();
            let printer = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    println!("{}", event);
                }
            });
            let result = orchestrator.run(&job_id, batch, options, &out, Some(tx)).await;
            printer.await?;
            let result = result?;
            println!("{}", serde_json::to_string_pretty(&result.statistics)?);
            println!("{}", result.archive.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_templates(paths: &[PathBuf]) -> anyhow::Result<Vec<MxTemplate>> {
    paths
        .iter()
        .map(|p| MxTemplate::load(p).with_context(|| format!("loading template {}", p.display())))
        .collect()
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
