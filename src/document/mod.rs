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

//! # Document Module
//!
//! Templates and their text model.
//!
//! - **package** ([package.rs](package/index.html)): OOXML zip packages with
//!   copy-on-write parts, relationships and content types
//! - **text** ([text.rs](text/index.html)): paragraph and run scanning of
//!   XML parts with byte-range edits
//! - **runs** ([runs.rs](runs/index.html)): run reunification of fragmented
//!   placeholders
//!
//! A [`MxTemplate`] is loaded once and shared read-only between renders.

pub mod package;
pub mod runs;
pub mod text;

use std::path::Path;

use crate::errors::{MxError, Result};

pub use package::MxPackage;
pub use text::{MxDialect, MxParagraph, MxTextNode};

/// Document families a template can belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MxTemplateKind {
    /// `.docx`: full text and image support.
    WordProcessing,
    /// `.pptx`: text substitution only.
    Presentation,
    /// `.txt`, `.md`: one paragraph per line.
    PlainText,
}

impl MxTemplateKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "docx" => Some(MxTemplateKind::WordProcessing),
            "pptx" => Some(MxTemplateKind::Presentation),
            "txt" | "md" => Some(MxTemplateKind::PlainText),
            _ => None,
        }
    }

    pub fn dialect(self) -> Option<MxDialect> {
        match self {
            MxTemplateKind::WordProcessing => Some(MxDialect::Word),
            MxTemplateKind::Presentation => Some(MxDialect::Drawing),
            MxTemplateKind::PlainText => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum MxTemplateBody {
    Package(MxPackage),
    Text(String),
}

#[derive(Clone, Debug)]
pub struct MxTemplate {
    /// File name, used to name outputs and in reports.
    pub name: String,
    pub kind: MxTemplateKind,
    pub body: MxTemplateBody,
}

impl MxTemplate {
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let kind = MxTemplateKind::from_name(&name).ok_or_else(|| {
            MxError::validation(format!("unsupported template type: {}", name))
        })?;
        let body = match kind {
            MxTemplateKind::PlainText => MxTemplateBody::Text(
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| MxError::validation(format!("{}: {}", name, e)))?,
            ),
            _ => MxTemplateBody::Package(MxPackage::from_bytes(bytes)?),
        };
        Ok(MxTemplate { name, kind, body })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| MxError::validation(format!("invalid template path: {}", path.display())))?
            .to_string();
        let bytes = std::fs::read(path)?;
        Self::from_bytes(name, &bytes)
    }

    /// File name without extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }

    /// Extension including the dot, lowercase.
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default()
    }

    /// Paragraph text of every scanned part, in part order.
    pub fn paragraphs(&self) -> Result<Vec<(String, Vec<MxParagraph>)>> {
        match (&self.body, self.kind.dialect()) {
            (MxTemplateBody::Package(package), Some(dialect)) => text_parts(self.kind, package)
                .into_iter()
                .map(|part| {
                    let xml = package.get_text(&part)?.unwrap_or_default();
                    let paragraphs = text::scan_paragraphs(&part, &xml, dialect)?;
                    Ok((part, paragraphs))
                })
                .collect(),
            (MxTemplateBody::Text(text), _) => Ok(vec![(self.name.clone(), text_lines(text))]),
            (MxTemplateBody::Package(_), None) => Ok(Vec::new()),
        }
    }
}

/// Lines of a plain-text template as single-node paragraphs.
pub fn text_lines(text: &str) -> Vec<MxParagraph> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|line| {
            let content = line.trim_end_matches(['\n', '\r']);
            let node = MxTextNode {
                text: content.to_string(),
                element: offset..offset + content.len(),
                run_properties: None,
            };
            offset += line.len();
            MxParagraph { nodes: vec![node] }
        })
        .collect()
}

/// Parts that carry merge text, in a stable order.
pub fn text_parts(kind: MxTemplateKind, package: &MxPackage) -> Vec<String> {
    let mut parts: Vec<String> = match kind {
        MxTemplateKind::WordProcessing => package
            .names()
            .filter(|n| {
                *n == "word/document.xml"
                    || *n == "word/footnotes.xml"
                    || *n == "word/endnotes.xml"
                    || numbered_part(n, "word/header").is_some()
                    || numbered_part(n, "word/footer").is_some()
            })
            .map(str::to_string)
            .collect(),
        MxTemplateKind::Presentation => package
            .names()
            .filter(|n| numbered_part(n, "ppt/slides/slide").is_some())
            .map(str::to_string)
            .collect(),
        MxTemplateKind::PlainText => Vec::new(),
    };
    parts.sort_by_key(|p| part_order(p));
    parts
}

fn numbered_part(name: &str, prefix: &str) -> Option<u32> {
    let rest = name.strip_prefix(prefix)?.strip_suffix(".xml")?;
    if rest.is_empty() {
        return Some(0);
    }
    rest.parse().ok()
}

fn part_order(name: &str) -> (u8, u32) {
    if name == "word/document.xml" {
        return (0, 0);
    }
    for (rank, prefix) in [(1, "word/header"), (2, "word/footer"), (4, "ppt/slides/slide")] {
        if let Some(n) = numbered_part(name, prefix) {
            return (rank, n);
        }
    }
    (3, 0)
}
