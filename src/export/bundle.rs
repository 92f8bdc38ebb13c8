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

//! Batch report and result archive.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::Result;
use crate::export::manifest::collect_files;
use crate::job::MxRowOutcome;

pub const REPORT_FILE: &str = "job_report.csv";

/// Writes one report line per produced (or attempted) file.
pub fn write_report(path: &Path, outcomes: &[MxRowOutcome]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Row", "Identifier", "Output File", "Status", "Error Details"])?;
    let mut sorted: Vec<&MxRowOutcome> = outcomes.iter().collect();
    sorted.sort_by_key(|o| o.row);
    for outcome in sorted {
        let row = outcome.row.to_string();
        for template in &outcome.templates {
            let mut details: Vec<String> = template.error.iter().cloned().collect();
            details.extend(
                template
                    .placeholder_failures
                    .iter()
                    .map(|p| format!("{}: {}", p.placeholder, p.message)),
            );
            let output = template.output.as_deref().unwrap_or(&template.template);
            let status = template.status.to_string();
            let details = details.join("; ");
            writer.write_record([
                row.as_str(),
                outcome.identifier.as_str(),
                output,
                status.as_str(),
                details.as_str(),
            ])?;
            if let Some(pdf) = &template.pdf {
                writer.write_record([
                    row.as_str(),
                    outcome.identifier.as_str(),
                    pdf.as_str(),
                    "Success",
                    "",
                ])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Archives every file under `root` into `dest`.
pub fn zip_directory(root: &Path, dest: &Path) -> Result<()> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files)?;
    files.sort();
    let mut writer = ZipWriter::new(File::create(dest)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut buffer = Vec::new();
    for relative in files {
        buffer.clear();
        File::open(root.join(&relative))?.read_to_end(&mut buffer)?;
        writer.start_file(relative.as_str(), options)?;
        writer.write_all(&buffer)?;
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{MxOutcomeStatus, MxTemplateOutcome};

    #[test]
    fn report_lists_failures_with_details() {
        let dir = tempfile::tempdir().unwrap();
        let outcomes = vec![MxRowOutcome {
            row: 2,
            identifier: "ACME".into(),
            templates: vec![MxTemplateOutcome {
                template: "c.docx".into(),
                status: MxOutcomeStatus::Failed,
                output: Some("c - ACME.docx".into()),
                pdf: None,
                error: Some("PDF conversion: timed out".into()),
                placeholder_failures: Vec::new(),
            }],
        }];
        let path = dir.path().join(REPORT_FILE);
        write_report(&path, &outcomes).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Row,Identifier,Output File,Status,Error Details");
        assert_eq!(lines[1], "2,ACME,c - ACME.docx,Failed,PDF conversion: timed out");
    }

    #[test]
    fn zip_keeps_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        std::fs::create_dir_all(root.join("G")).unwrap();
        std::fs::write(root.join("G/x.txt"), b"x").unwrap();
        let dest = dir.path().join("r.zip");
        zip_directory(&root, &dest).unwrap();
        let archive = zip::ZipArchive::new(File::open(dest).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names, vec!["G/x.txt"]);
    }
}
