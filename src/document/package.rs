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

//! OOXML packages held in memory.
//!
//! Entry payloads are reference counted, so cloning a package for one render
//! copies only the entry table; a rewritten part replaces its own payload
//! and leaves the source package untouched.

use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::{MxError, Result};

const RELATIONSHIPS_EMPTY: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "</Relationships>"
);

#[derive(Clone, Debug, Default)]
pub struct MxPackage {
    entries: Vec<(String, Arc<[u8]>)>,
}

impl MxPackage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        for idx in 0..archive.len() {
            let mut file = archive.by_index(idx)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push((file.name().to_string(), Arc::from(data)));
        }
        Ok(MxPackage { entries })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_ref())
    }

    /// Reads a part as UTF-8 text.
    pub fn get_text(&self, name: &str) -> Result<Option<String>> {
        match self.get(name) {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| MxError::xml(name, e.to_string())),
            None => Ok(None),
        }
    }

    /// Replaces a part, or appends it when absent.
    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        let data: Arc<[u8]> = Arc::from(data);
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    pub fn set_text(&mut self, name: &str, text: String) {
        self.set(name, text.into_bytes());
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        before != self.entries.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.entries {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }
        Ok(writer.finish()?.into_inner())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Drops `docProps/thumbnail.*` together with its package relationship,
    /// so office suites regenerate the preview from the merged content.
    pub fn strip_thumbnail(&mut self) -> Result<bool> {
        let thumbnails: Vec<String> = self
            .names()
            .filter(|n| n.starts_with("docProps/thumbnail."))
            .map(str::to_string)
            .collect();
        if thumbnails.is_empty() {
            return Ok(false);
        }
        for name in &thumbnails {
            self.remove(name);
        }
        if let Some(rels) = self.get_text("_rels/.rels")? {
            let cleaned = remove_relationships(&rels, |target| target.contains("thumbnail"));
            self.set_text("_rels/.rels", cleaned);
        }
        Ok(true)
    }

    /// Relationship part that belongs to `part` (`word/document.xml` ->
    /// `word/_rels/document.xml.rels`).
    pub fn relationships_name(part: &str) -> String {
        match part.rsplit_once('/') {
            Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
            None => format!("_rels/{}.rels", part),
        }
    }

    /// Adds a relationship from `part` and returns its new id.
    pub fn add_relationship(&mut self, part: &str, kind: &str, target: &str) -> Result<String> {
        let rels_name = Self::relationships_name(part);
        let rels = self
            .get_text(&rels_name)?
            .unwrap_or_else(|| RELATIONSHIPS_EMPTY.to_string());
        let next = next_relationship_number(&rels);
        let id = format!("rId{}", next);
        let entry = format!(
            "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"/>",
            id, kind, target
        );
        let updated = insert_before(&rels, "</Relationships>", &entry)
            .ok_or_else(|| MxError::xml(rels_name.as_str(), "missing </Relationships>"))?;
        self.set_text(&rels_name, updated);
        Ok(id)
    }

    /// Registers a default content type for a file extension if missing.
    pub fn ensure_default_content_type(&mut self, extension: &str, mime: &str) -> Result<()> {
        const NAME: &str = "[Content_Types].xml";
        let types = self
            .get_text(NAME)?
            .ok_or_else(|| MxError::xml(NAME, "package has no content types part"))?;
        let needle = format!("extension=\"{}\"", extension.to_ascii_lowercase());
        if types.to_ascii_lowercase().contains(&needle) {
            return Ok(());
        }
        let entry = format!("<Default Extension=\"{}\" ContentType=\"{}\"/>", extension, mime);
        let updated = insert_before(&types, "</Types>", &entry)
            .ok_or_else(|| MxError::xml(NAME, "missing </Types>"))?;
        self.set_text(NAME, updated);
        Ok(())
    }
}

fn insert_before(text: &str, marker: &str, insert: &str) -> Option<String> {
    let idx = text.rfind(marker)?;
    let mut out = String::with_capacity(text.len() + insert.len());
    out.push_str(&text[..idx]);
    out.push_str(insert);
    out.push_str(&text[idx..]);
    Some(out)
}

fn next_relationship_number(rels: &str) -> u32 {
    rels.match_indices("Id=\"rId")
        .filter_map(|(idx, m)| {
            let digits: String = rels[idx + m.len()..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            digits.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0)
        + 1
}

/// Removes every `<Relationship .../>` whose target matches.
fn remove_relationships(rels: &str, matches: impl Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(rels.len());
    let mut rest = rels;
    while let Some(start) = rest.find("<Relationship ") {
        let Some(len) = rest[start..].find("/>") else {
            break;
        };
        let element = &rest[start..start + len + 2];
        out.push_str(&rest[..start]);
        let target = element
            .split("Target=\"")
            .nth(1)
            .and_then(|t| t.split('"').next())
            .unwrap_or_default();
        if !matches(target) {
            out.push_str(element);
        }
        rest = &rest[start + len + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MxPackage {
        let mut pkg = MxPackage::default();
        pkg.set_text(
            "[Content_Types].xml",
            "<Types><Default Extension=\"xml\" ContentType=\"application/xml\"/></Types>".into(),
        );
        pkg.set_text(
            "_rels/.rels",
            concat!(
                "<Relationships>",
                "<Relationship Id=\"rId1\" Type=\"doc\" Target=\"word/document.xml\"/>",
                "<Relationship Id=\"rId2\" Type=\"thumb\" Target=\"docProps/thumbnail.jpeg\"/>",
                "</Relationships>"
            )
            .into(),
        );
        pkg.set("docProps/thumbnail.jpeg", vec![1, 2, 3]);
        pkg
    }

    #[test]
    fn thumbnail_and_relationship_are_removed() {
        let mut pkg = sample();
        assert!(pkg.strip_thumbnail().unwrap());
        assert!(!pkg.contains("docProps/thumbnail.jpeg"));
        let rels = pkg.get_text("_rels/.rels").unwrap().unwrap();
        assert!(rels.contains("rId1"));
        assert!(!rels.contains("thumbnail"));
    }

    #[test]
    fn relationships_get_fresh_ids() {
        let mut pkg = sample();
        let id = pkg
            .add_relationship("word/document.xml", "image", "media/a.png")
            .unwrap();
        assert_eq!(id, "rId1");
        let id = pkg
            .add_relationship("word/document.xml", "image", "media/b.png")
            .unwrap();
        assert_eq!(id, "rId2");
        pkg.ensure_default_content_type("png", "image/png").unwrap();
        pkg.ensure_default_content_type("PNG", "image/png").unwrap();
        let types = pkg.get_text("[Content_Types].xml").unwrap().unwrap();
        assert_eq!(types.matches("Extension=\"png\"").count(), 1);
    }

    #[test]
    fn clones_share_untouched_parts() {
        let source = sample();
        let mut copy = source.clone();
        copy.set_text("_rels/.rels", "<Relationships></Relationships>".into());
        assert!(source.get_text("_rels/.rels").unwrap().unwrap().contains("rId2"));
        let bytes = copy.to_bytes().unwrap();
        let back = MxPackage::from_bytes(&bytes).unwrap();
        assert_eq!(back.names().count(), 3);
    }
}
