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

//! # Merx Merge Engine Tests
//!
//! Renders in-memory templates and inspects the resulting packages.

#[path = "../common/mod.rs"]
mod common;

use merx::engine::{image_extent, IMAGE_NOT_FOUND};
use merx::locale::PT_BR;
use merx::{MxAssetSet, MxError, MxImageSpec, MxMergeEngine, MxPackage, MxTemplate};

use common::{docx_template, paragraph_texts, part_xml, png, pptx, row};

/// A placeholder split across runs is replaced in its opening run and the
/// formatting of the other runs survives.
#[test]
fn test_fragmented_placeholder_is_substituted() {
    let template = docx_template(
        "letter.docx",
        &[&["Dear {{ cli", "ent | format_string(upper) }}", ", welcome"]],
    );
    let rendered = MxMergeEngine::new(&PT_BR)
        .render(&template, &row(0, &[("client", "acme corp")]), None)
        .unwrap();
    assert_eq!(rendered.substitutions, 1);
    assert!(rendered.failures.is_empty());
    assert_eq!(paragraph_texts("letter.docx", &rendered.bytes), vec!["Dear ACME CORP, welcome"]);
    let xml = part_xml(&rendered.bytes, "word/document.xml");
    assert!(xml.contains("<w:rPr><w:b/></w:rPr>"));
}

#[test]
fn test_template_is_never_mutated() {
    let template = docx_template("t.docx", &[&["{{ name }}"]]);
    let engine = MxMergeEngine::default();
    let first = engine.render(&template, &row(0, &[("name", "Ana")]), None).unwrap();
    let second = engine.render(&template, &row(1, &[("name", "Bia")]), None).unwrap();
    assert_eq!(paragraph_texts("t.docx", &first.bytes), vec!["Ana"]);
    assert_eq!(paragraph_texts("t.docx", &second.bytes), vec!["Bia"]);
    let untouched: Vec<String> = template
        .paragraphs()
        .unwrap()
        .into_iter()
        .flat_map(|(_, ps)| ps)
        .map(|p| p.texts().concat())
        .collect();
    assert_eq!(untouched, vec!["{{ name }}"]);
}

#[test]
fn test_thumbnail_is_stripped() {
    let template = docx_template("t.docx", &[&["{{ name }}"]]);
    let rendered = MxMergeEngine::default()
        .render(&template, &row(0, &[("name", "Ana")]), None)
        .unwrap();
    let package = MxPackage::from_bytes(&rendered.bytes).unwrap();
    assert!(!package.names().any(|n| n.starts_with("docProps/thumbnail")));
    assert!(!part_xml(&rendered.bytes, "_rels/.rels").contains("thumbnail"));
}

/// An image directive becomes an inline drawing backed by a new media part.
#[test]
fn test_image_is_embedded() {
    let template = docx_template("badge.docx", &[&["Photo: {{ photo | format_image(4) }} end"]]);
    let mut assets = MxAssetSet::new();
    assets.insert("ana.png", png(200, 100));
    let rendered = MxMergeEngine::default()
        .render(&template, &row(0, &[("photo", "ana.png")]), Some(&assets))
        .unwrap();
    assert!(rendered.failures.is_empty());

    let package = MxPackage::from_bytes(&rendered.bytes).unwrap();
    assert!(package.get("word/media/merx_image1.png").is_some());
    let rels = part_xml(&rendered.bytes, "word/_rels/document.xml.rels");
    assert!(rels.contains("Target=\"media/merx_image1.png\""));
    assert!(part_xml(&rendered.bytes, "[Content_Types].xml").contains("Extension=\"png\""));

    let xml = part_xml(&rendered.bytes, "word/document.xml");
    assert!(xml.contains("<wp:extent cx=\"1440000\" cy=\"720000\"/>"));
    assert_eq!(paragraph_texts("badge.docx", &rendered.bytes), vec!["Photo:  end"]);
}

#[test]
fn test_missing_image_degrades_to_marker() {
    let template = docx_template("badge.docx", &[&["{{ photo | format_image() }}"]]);
    let rendered = MxMergeEngine::default()
        .render(&template, &row(0, &[("photo", "nobody.png")]), Some(&MxAssetSet::new()))
        .unwrap();
    assert_eq!(rendered.failures.len(), 1);
    assert_eq!(rendered.failures[0].placeholder, "nobody.png");
    assert_eq!(paragraph_texts("badge.docx", &rendered.bytes), vec![IMAGE_NOT_FOUND]);
}

#[test]
fn test_presentation_images_become_file_names() {
    let template = MxTemplate::from_bytes("deck.pptx", &pptx(&["Logo: {{ lo", "go | image(2, 2) }}"])).unwrap();
    let rendered = MxMergeEngine::default()
        .render(&template, &row(0, &[("logo", "acme.png")]), None)
        .unwrap();
    assert!(rendered.failures.is_empty());
    assert_eq!(paragraph_texts("deck.pptx", &rendered.bytes), vec!["Logo: acme.png"]);
}

/// Invalid directives fall back to the raw value unless strict.
#[test]
fn test_strict_mode_rejects_bad_directives() {
    let template = docx_template("t.docx", &[&["{{ name | format_string(shout) }}"]]);
    let data = row(3, &[("name", "Ana")]);
    let lenient = MxMergeEngine::default().render(&template, &data, None).unwrap();
    assert_eq!(paragraph_texts("t.docx", &lenient.bytes), vec!["Ana"]);

    let err = MxMergeEngine::default().strict(true).render(&template, &data, None).unwrap_err();
    assert!(matches!(err, MxError::RowRender { row: 3, .. }));
}

#[test]
fn test_xml_illegal_value_fails_the_row() {
    let template = docx_template("t.docx", &[&["{{ name }}"]]);
    let err = MxMergeEngine::default()
        .render(&template, &row(0, &[("name", "bad\u{1}value")]), None)
        .unwrap_err();
    assert!(matches!(err, MxError::RowRender { .. }));
}

#[test]
fn test_plain_text_template() {
    let template = MxTemplate::from_bytes(
        "note.md",
        b"# {{ title | format_string(upper) }}\nDue {{ due | format_date(long, 'en') }}\n",
    )
    .unwrap();
    let rendered = MxMergeEngine::default()
        .render(&template, &row(0, &[("title", "report"), ("due", "2024-01-15")]), None)
        .unwrap();
    let text = String::from_utf8(rendered.bytes).unwrap();
    assert_eq!(text, "# REPORT\nDue January 15, 2024\n");
}

#[test]
fn test_extent_from_pixels_when_unsized() {
    let spec = MxImageSpec {
        filename: "a.png".into(),
        width_cm: None,
        height_cm: None,
    };
    assert_eq!(image_extent(&spec, 100, 50), (952_500, 476_250));
}
