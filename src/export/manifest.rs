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

//! `manifest.json`: what a batch consumed and produced.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{MxError, Result};
use crate::job::MxJobStatistics;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MxManifestFile {
    /// Path relative to the package root, `/`-separated.
    pub path: String,
    pub size: u64,
    /// blake3, hex.
    pub hash: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MxInputManifest {
    pub data_source: Option<String>,
    pub templates: Vec<String>,
    pub assets: Option<String>,
    pub identifier_column: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MxManifest {
    pub version: String,
    pub job_id: String,
    pub created_at: DateTime<Utc>,
    pub input: MxInputManifest,
    pub statistics: MxJobStatistics,
    pub success_rate: f64,
    pub total_size: u64,
    pub files: Vec<MxManifestFile>,
    pub metadata: BTreeMap<String, String>,
}

impl MxManifest {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MxError::internal(format!("failed to serialize manifest: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| MxError::validation(format!("invalid manifest JSON: {}", e)))
    }

    pub fn write_to(&self, dir: &Path) -> Result<()> {
        std::fs::write(dir.join(MANIFEST_FILE), self.to_json()?)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct MxManifestBuilder {
    manifest: MxManifest,
}

impl MxManifestBuilder {
    pub fn new(job_id: impl Into<String>) -> Self {
        MxManifestBuilder {
            manifest: MxManifest {
                version: env!("CARGO_PKG_VERSION").to_string(),
                job_id: job_id.into(),
                created_at: Utc::now(),
                input: MxInputManifest::default(),
                statistics: MxJobStatistics::default(),
                success_rate: 0.0,
                total_size: 0,
                files: Vec::new(),
                metadata: BTreeMap::new(),
            },
        }
    }

    pub fn input(mut self, input: MxInputManifest) -> Self {
        self.manifest.input = input;
        self
    }

    pub fn statistics(mut self, statistics: MxJobStatistics) -> Self {
        self.manifest.success_rate = statistics.success_rate();
        self.manifest.statistics = statistics;
        self
    }

    pub fn add_file(mut self, path: impl Into<String>, size: u64, hash: impl Into<String>) -> Self {
        self.manifest.files.push(MxManifestFile {
            path: path.into(),
            size,
            hash: hash.into(),
        });
        self.manifest.total_size += size;
        self
    }

    /// Hashes every file under `root`, in path order.
    pub fn scan_directory(mut self, root: &Path) -> Result<Self> {
        let mut files = Vec::new();
        collect_files(root, root, &mut files)?;
        files.sort();
        for relative in files {
            let path = root.join(&relative);
            let size = std::fs::metadata(&path)?.len();
            let hash = compute_file_hash(&path)?;
            self = self.add_file(relative, size, hash);
        }
        Ok(self)
    }

    pub fn metadata(mut self, key: &str, value: &str) -> Self {
        self.manifest.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> MxManifest {
        self.manifest
    }
}

/// Streams a file through blake3.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Relative `/`-separated paths of all files below `dir`.
pub(crate) fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            out.push(parts.join("/"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_hashes_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ACME")).unwrap();
        std::fs::write(dir.path().join("ACME/a.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"xy").unwrap();

        let manifest = MxManifestBuilder::new("job_1")
            .scan_directory(dir.path())
            .unwrap()
            .build();
        let paths: Vec<&str> = manifest.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["ACME/a.txt", "b.txt"]);
        assert_eq!(manifest.total_size, 7);
        assert_eq!(manifest.files[0].hash, blake3::hash(b"hello").to_hex().to_string());
    }

    #[test]
    fn success_rate_follows_statistics() {
        let stats = MxJobStatistics {
            total_rows: 4,
            processed_rows: 4,
            successful_rows: 3,
            partial_rows: 0,
            failed_rows: 1,
        };
        let manifest = MxManifestBuilder::new("job_1").statistics(stats).build();
        assert!((manifest.success_rate - 0.75).abs() < 1e-9);
        let back = MxManifest::from_json(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(back.statistics.failed_rows, 1);
    }
}
