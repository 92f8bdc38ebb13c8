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

//! Fixture builders shared by the integration tests. Documents are built in
//! memory with the `zip` crate.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use merx::{MxCellValue, MxDataRow, MxTemplate};
use zip::write::FileOptions;
use zip::ZipWriter;

const CONTENT_TYPES: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
    "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
    "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
    "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    "<Override PartName=\"/word/document.xml\" ",
    "ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>",
    "</Types>"
);

const ROOT_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" ",
    "Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" ",
    "Target=\"word/document.xml\"/>",
    "<Relationship Id=\"rId2\" ",
    "Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail\" ",
    "Target=\"docProps/thumbnail.jpeg\"/>",
    "</Relationships>"
);

const DOCUMENT_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" ",
    "Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" ",
    "Target=\"styles.xml\"/>",
    "</Relationships>"
);

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Body XML of a word-processing document. Every inner slice is one
/// paragraph and every string one run; odd runs are bold.
pub fn document_xml(paragraphs: &[&[&str]]) -> String {
    let mut body = String::new();
    for runs in paragraphs {
        body.push_str("<w:p><w:pPr><w:jc w:val=\"left\"/></w:pPr>");
        for (idx, run) in runs.iter().enumerate() {
            body.push_str("<w:r>");
            if idx % 2 == 1 {
                body.push_str("<w:rPr><w:b/></w:rPr>");
            }
            body.push_str(&format!("<w:t xml:space=\"preserve\">{}</w:t></w:r>", escape(run)));
        }
        body.push_str("</w:p>");
    }
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
            "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
            "<w:body>{}<w:sectPr/></w:body></w:document>"
        ),
        body
    )
}

/// Zips the given entries.
pub fn zip_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A minimal `.docx` with a thumbnail.
pub fn docx(paragraphs: &[&[&str]]) -> Vec<u8> {
    let document = document_xml(paragraphs);
    zip_entries(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("docProps/thumbnail.jpeg", &b"not really a jpeg"[..]),
        ("word/document.xml", document.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
    ])
}

/// A minimal `.pptx` with one slide.
pub fn pptx(runs: &[&str]) -> Vec<u8> {
    let mut paragraph = String::from("<a:p>");
    for run in runs {
        paragraph.push_str(&format!("<a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r>", escape(run)));
    }
    paragraph.push_str("</a:p>");
    let slide = format!(
        concat!(
            "<p:sld xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" ",
            "xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
            "<p:cSld><p:spTree><p:sp><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"
        ),
        paragraph
    );
    zip_entries(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("ppt/slides/slide1.xml", slide.as_bytes()),
    ])
}

pub fn docx_template(name: &str, paragraphs: &[&[&str]]) -> MxTemplate {
    MxTemplate::from_bytes(name, &docx(paragraphs)).unwrap()
}

/// Paragraph texts of a rendered document, one string per paragraph.
pub fn paragraph_texts(name: &str, bytes: &[u8]) -> Vec<String> {
    let template = MxTemplate::from_bytes(name, bytes).unwrap();
    template
        .paragraphs()
        .unwrap()
        .into_iter()
        .flat_map(|(_, paragraphs)| paragraphs)
        .map(|p| p.texts().concat())
        .collect()
}

/// Raw XML of one part of a rendered package.
pub fn part_xml(bytes: &[u8], part: &str) -> String {
    let package = merx::MxPackage::from_bytes(bytes).unwrap();
    package.get_text(part).unwrap().unwrap()
}

pub fn row(index: usize, pairs: &[(&str, &str)]) -> MxDataRow {
    MxDataRow::from_pairs(
        index,
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), MxCellValue::Text(v.to_string()))),
    )
}

/// A `width` x `height` PNG.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::DynamicImage::new_rgb8(width, height);
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
