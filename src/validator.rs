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

//! # Merx Validator Module
//!
//! Variable extraction and template/data compatibility checks.
//!
//! Extraction reunifies the runs of every paragraph before scanning, so a
//! placeholder split by the authoring tool is still seen once and whole.
//! Validation compares each placeholder's base name, ignoring its pipeline,
//! with the column set of a data source.

use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::document::runs::reunify;
use crate::document::MxTemplate;
use crate::dsl::parser::{is_valid_variable, scan_placeholders, MxDirectiveParser};
use crate::errors::Result;

/// A variable referenced by a template.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MxTemplateVariable {
    pub name: String,
    pub template: String,
    pub occurrences: usize,
}

/// Everything one pass over a template found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MxExtraction {
    pub variables: BTreeSet<MxTemplateVariable>,
    /// Directives that failed to parse, with the parser's message.
    pub invalid_directives: Vec<String>,
}

/// Extracts the variables referenced by `template`.
pub fn extract(template: &MxTemplate) -> Result<BTreeSet<MxTemplateVariable>> {
    extract_detailed(template).map(|e| e.variables)
}

pub fn extract_detailed(template: &MxTemplate) -> Result<MxExtraction> {
    let parser = MxDirectiveParser::new();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut invalid = Vec::new();
    for (_, paragraphs) in template.paragraphs()? {
        for paragraph in paragraphs {
            for text in reunify(&paragraph.texts()) {
                for placeholder in scan_placeholders(&text) {
                    let name = placeholder.base_name();
                    if !is_valid_variable(name) {
                        invalid.push(format!("{{{{{}}}}}: invalid variable name", placeholder.inner));
                        continue;
                    }
                    if let Err(err) = parser.parse_placeholder(&placeholder.inner) {
                        invalid.push(err.to_string());
                    }
                    *counts.entry(name.to_string()).or_insert(0) += 1;
                }
            }
        }
    }
    let variables = counts
        .into_iter()
        .map(|(name, occurrences)| MxTemplateVariable {
            name,
            template: template.name.clone(),
            occurrences,
        })
        .collect();
    Ok(MxExtraction {
        variables,
        invalid_directives: invalid,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MxTemplateStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ISSUES")]
    Issues,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxTemplateReport {
    pub template: String,
    pub status: MxTemplateStatus,
    pub missing_vars: Vec<String>,
    pub matched_vars: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_directives: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxCompatibilityReport {
    pub overall_valid: bool,
    pub details: Vec<MxTemplateReport>,
}

/// Builds the report for one template from its extraction.
pub fn compare(template: &str, extraction: &MxExtraction, columns: &BTreeSet<String>) -> MxTemplateReport {
    let (matched, missing): (Vec<String>, Vec<String>) = extraction
        .variables
        .iter()
        .map(|v| v.name.clone())
        .partition(|name| columns.contains(name));
    MxTemplateReport {
        template: template.to_string(),
        status: if missing.is_empty() {
            MxTemplateStatus::Ok
        } else {
            MxTemplateStatus::Issues
        },
        missing_vars: missing,
        matched_vars: matched,
        invalid_directives: extraction.invalid_directives.clone(),
    }
}

/// Checks every template against the columns of a data source.
pub fn validate<S: AsRef<str>>(templates: &[MxTemplate], columns: &[S]) -> Result<MxCompatibilityReport> {
    let columns: BTreeSet<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();

    #[cfg(feature = "parallel")]
    let extractions: Vec<Result<MxExtraction>> = templates.par_iter().map(extract_detailed).collect();
    #[cfg(not(feature = "parallel"))]
    let extractions: Vec<Result<MxExtraction>> = templates.iter().map(extract_detailed).collect();

    let mut details = Vec::with_capacity(templates.len());
    for (template, extraction) in templates.iter().zip(extractions) {
        details.push(compare(&template.name, &extraction?, &columns));
    }
    let overall_valid = details.iter().all(|d| d.missing_vars.is_empty());
    log::info!(
        "validated {} template(s) against {} column(s): {}",
        templates.len(),
        columns.len(),
        if overall_valid { "ok" } else { "issues found" }
    );
    Ok(MxCompatibilityReport {
        overall_valid,
        details,
    })
}
