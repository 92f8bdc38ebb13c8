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

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{MxError, Result};
use crate::ingest::format::{MxDataFormat, MxFormatDetector};
use crate::record::{MxCellValue, MxDataSet};

/// Rows returned by a preview.
pub const PREVIEW_ROWS: usize = 5;

#[derive(Clone, Debug)]
pub struct MxReaderConfig {
    /// Skip malformed CSV records instead of failing the load.
    pub skip_errors: bool,
    pub max_errors: usize,
}

impl Default for MxReaderConfig {
    fn default() -> Self {
        Self {
            skip_errors: true,
            max_errors: 100,
        }
    }
}

/// Headers and the first rows of a data source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MxDataPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Value>,
    pub total_rows: usize,
}

#[derive(Clone, Debug, Default)]
pub struct MxDataReader {
    config: MxReaderConfig,
    detector: MxFormatDetector,
}

impl MxDataReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: MxReaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn read_path(&self, path: &Path) -> Result<MxDataSet> {
        let bytes = std::fs::read(path)?;
        let format = match self.detector.detect_from_path(path) {
            MxDataFormat::Unknown => self.detector.detect_from_content(&bytes),
            known => known,
        };
        self.read_bytes(&bytes, format).map_err(|err| match err {
            MxError::Validation { message } => {
                MxError::validation(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    pub fn read_bytes(&self, bytes: &[u8], format: MxDataFormat) -> Result<MxDataSet> {
        let text = decode(bytes);
        let set = match format {
            MxDataFormat::Csv => self.read_csv(&text)?,
            MxDataFormat::Json => read_json(&text)?,
            MxDataFormat::Jsonl => read_jsonl(&text)?,
            MxDataFormat::Unknown => {
                return Err(MxError::validation("unsupported data source format"))
            }
        };
        log::info!(
            "loaded {} row(s) with {} column(s)",
            set.len(),
            set.columns().len()
        );
        Ok(set)
    }

    pub fn preview_path(&self, path: &Path) -> Result<MxDataPreview> {
        Ok(preview(&self.read_path(path)?))
    }

    fn read_csv(&self, text: &str) -> Result<MxDataSet> {
        let delimiter = self.detector.sniff_delimiter(text);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| MxError::validation(format!("CSV headers error: {}", e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(MxError::validation("CSV has no header row"));
        }

        let mut set = MxDataSet::new(headers);
        let mut error_count = 0;
        for (idx, result) in reader.records().enumerate() {
            match result {
                Ok(record) => {
                    if record.iter().all(|f| f.trim().is_empty()) {
                        continue;
                    }
                    let values = record
                        .iter()
                        .map(|field| {
                            if field.trim().is_empty() {
                                MxCellValue::Empty
                            } else {
                                MxCellValue::Text(field.to_string())
                            }
                        })
                        .collect();
                    set.push_row(values);
                }
                Err(e) => {
                    error_count += 1;
                    if !self.config.skip_errors || error_count > self.config.max_errors {
                        return Err(MxError::validation(format!(
                            "Too many errors ({}): last error at row {}: {}",
                            error_count, idx, e
                        )));
                    }
                    log::warn!("Skipping invalid CSV row {}: {}", idx, e);
                }
            }
        }
        Ok(set)
    }
}

/// UTF-8 (BOM stripped) or, failing that, Latin-1.
fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn read_json(text: &str) -> Result<MxDataSet> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| MxError::validation(format!("Invalid JSON: {}", e)))?;
    let objects = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => return Err(MxError::validation("JSON must be an array of objects or an object")),
    };
    objects_to_set(objects)
}

fn read_jsonl(text: &str) -> Result<MxDataSet> {
    let objects = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<Value>(line)
                .map_err(|e| MxError::validation(format!("line {}: {}", idx + 1, e)))
        })
        .collect::<Result<Vec<_>>>()?;
    objects_to_set(objects)
}

/// Builds a data set whose columns are the union of every object's
/// flattened keys, in first-seen order.
pub fn objects_to_set(objects: Vec<Value>) -> Result<MxDataSet> {
    let mut columns: Vec<String> = Vec::new();
    let mut flattened = Vec::with_capacity(objects.len());
    for (idx, object) in objects.into_iter().enumerate() {
        let Value::Object(map) = object else {
            return Err(MxError::validation(format!("row {} is not an object", idx)));
        };
        let mut flat = Map::new();
        flatten("", map, &mut flat);
        for key in flat.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        flattened.push(flat);
    }
    let mut set = MxDataSet::new(columns.clone());
    for flat in flattened {
        let values = columns
            .iter()
            .map(|c| flat.get(c).map(MxCellValue::from_json).unwrap_or(MxCellValue::Empty))
            .collect();
        set.push_row(values);
    }
    Ok(set)
}

fn flatten(prefix: &str, map: Map<String, Value>, out: &mut Map<String, Value>) {
    for (key, value) in map {
        let name = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) => flatten(&name, inner, out),
            other => {
                out.insert(name, other);
            }
        }
    }
}

/// Headers plus the first [`PREVIEW_ROWS`] rows.
pub fn preview(set: &MxDataSet) -> MxDataPreview {
    MxDataPreview {
        headers: set.columns().to_vec(),
        rows: set.rows().iter().take(PREVIEW_ROWS).map(|r| r.to_json()).collect(),
        total_rows: set.len(),
    }
}
