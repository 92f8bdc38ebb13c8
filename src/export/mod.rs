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

//! # Output Packaging
//!
//! Naming and placement of rendered files, plus the artefacts that close a
//! batch.
//!
//! - **mod.rs**: identifier sanitising, file names, flat/grouped layout
//! - **manifest** ([manifest.rs](manifest/index.html)): `manifest.json` with
//!   per-file blake3 hashes and batch totals
//! - **bundle** ([bundle.rs](bundle/index.html)): `job_report.csv` and the
//!   result archive
//!
//! Output names are a pure function of the row's own identifier. Two rows
//! with the same identifier write the same path and the later one wins.

pub mod bundle;
pub mod manifest;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::record::MxDataRow;

pub use bundle::{write_report, zip_directory, REPORT_FILE};
pub use manifest::{compute_file_hash, MxInputManifest, MxManifest, MxManifestBuilder, MxManifestFile, MANIFEST_FILE};

fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r"[^\p{Alphabetic}\p{Nd} ._-]").unwrap())
}

/// Keeps letters, digits, space, `.`, `_` and `-`; trailing whitespace is
/// dropped.
pub fn sanitize_identifier(raw: &str) -> String {
    unsafe_chars().replace_all(raw, "").trim_end().to_string()
}

/// Identifier of a row: the sanitised value of `column`, or `Row_<n>`
/// (one-based) when the column is unset, missing, blank, sanitises away or
/// is made only of dots.
pub fn row_identifier(row: &MxDataRow, column: Option<&str>) -> String {
    column
        .and_then(|c| row.get(c))
        .map(|value| value.to_string())
        .filter(|value| !value.trim().is_empty())
        .map(|value| sanitize_identifier(&value))
        .filter(|value| !value.trim().is_empty() && !value.trim().chars().all(|c| c == '.'))
        .unwrap_or_else(|| format!("Row_{}", row.index + 1))
}

/// `"<stem> - <identifier><extension>"`.
pub fn output_file_name(stem: &str, identifier: &str, extension: &str) -> String {
    format!("{} - {}{}", stem, identifier, extension)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MxOutputLayout {
    #[default]
    Flat,
    /// One folder per identifier.
    Grouped,
}

impl MxOutputLayout {
    pub fn from_grouping(group_by_folders: bool) -> Self {
        if group_by_folders {
            MxOutputLayout::Grouped
        } else {
            MxOutputLayout::Flat
        }
    }

    /// Directory receiving the outputs of `identifier`.
    pub fn directory(self, root: &Path, identifier: &str) -> PathBuf {
        match self {
            MxOutputLayout::Flat => root.to_path_buf(),
            MxOutputLayout::Grouped => root.join(identifier),
        }
    }

    /// Archive-relative path of `file_name`.
    pub fn relative(self, identifier: &str, file_name: &str) -> String {
        match self {
            MxOutputLayout::Flat => file_name.to_string(),
            MxOutputLayout::Grouped => format!("{}/{}", identifier, file_name),
        }
    }
}
