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

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MxDataFormat {
    Csv,
    Json,
    Jsonl,
    Unknown,
}

#[derive(Clone, Debug)]
pub struct MxFormatDetector {
    sample_size: usize,
}

impl Default for MxFormatDetector {
    fn default() -> Self {
        Self { sample_size: 8192 }
    }
}

impl MxFormatDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    pub fn detect_from_path(&self, path: &Path) -> MxDataFormat {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "csv" | "tsv" | "txt" => MxDataFormat::Csv,
            "json" => MxDataFormat::Json,
            "jsonl" | "ndjson" => MxDataFormat::Jsonl,
            _ => MxDataFormat::Unknown,
        }
    }

    pub fn detect_from_content(&self, content: &[u8]) -> MxDataFormat {
        let sample = &content[..content.len().min(self.sample_size)];
        let text = String::from_utf8_lossy(sample);
        let trimmed = text.trim_start_matches('\u{feff}').trim();
        if trimmed.is_empty() {
            return MxDataFormat::Unknown;
        }
        if trimmed.starts_with('[') {
            return MxDataFormat::Json;
        }
        if trimmed.starts_with('{') {
            if trimmed.contains("}\n{") || trimmed.contains("}\r\n{") {
                return MxDataFormat::Jsonl;
            }
            return MxDataFormat::Json;
        }
        if trimmed.contains('\n') || trimmed.contains(',') || trimmed.contains(';') {
            return MxDataFormat::Csv;
        }
        MxDataFormat::Unknown
    }

    /// Picks `;`, `\t` or `,` from the header line, preferring the most
    /// frequent outside quotes. Ties go to `,`.
    pub fn sniff_delimiter(&self, content: &str) -> u8 {
        let header = content.lines().next().unwrap_or_default();
        let mut counts = [(b',', 0usize), (b';', 0), (b'\t', 0)];
        let mut quoted = false;
        for ch in header.bytes() {
            if ch == b'"' {
                quoted = !quoted;
                continue;
            }
            if quoted {
                continue;
            }
            if let Some(entry) = counts.iter_mut().find(|(d, _)| *d == ch) {
                entry.1 += 1;
            }
        }
        counts
            .iter()
            .fold((b',', 0), |best, &(d, n)| if n > best.1 { (d, n) } else { best })
            .0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_content() {
        let detector = MxFormatDetector::new();
        assert_eq!(detector.detect_from_content(b"[{\"a\":1}]"), MxDataFormat::Json);
        assert_eq!(detector.detect_from_content(b"{\"a\":1}\n{\"a\":2}"), MxDataFormat::Jsonl);
        assert_eq!(detector.detect_from_content(b"a,b\n1,2"), MxDataFormat::Csv);
        assert_eq!(detector.detect_from_content(b"   "), MxDataFormat::Unknown);
    }

    #[test]
    fn sniffs_semicolons() {
        let detector = MxFormatDetector::new();
        assert_eq!(detector.sniff_delimiter("nome;valor\n\"a,b\";1"), b';');
        assert_eq!(detector.sniff_delimiter("\"x;y\",b\n"), b',');
    }
}
