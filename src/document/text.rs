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

//! Paragraph/run text model over OOXML parts.
//!
//! A part is scanned once with `quick-xml`; every text element is recorded
//! with its byte range so that rewrites are plain string splices applied
//! back to front. Untouched bytes of the part are never re-serialised.

use std::ops::Range;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::errors::{MxError, Result};

/// Element names of one OOXML text vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MxDialect {
    /// WordprocessingML (`w:p`, `w:r`, `w:t`).
    Word,
    /// DrawingML text bodies used by slides (`a:p`, `a:r`, `a:t`).
    Drawing,
}

impl MxDialect {
    fn paragraph(self) -> &'static [u8] {
        match self {
            MxDialect::Word => b"w:p",
            MxDialect::Drawing => b"a:p",
        }
    }

    fn run(self) -> &'static [u8] {
        match self {
            MxDialect::Word => b"w:r",
            MxDialect::Drawing => b"a:r",
        }
    }

    fn text(self) -> &'static [u8] {
        match self {
            MxDialect::Word => b"w:t",
            MxDialect::Drawing => b"a:t",
        }
    }

    fn run_properties(self) -> &'static [u8] {
        match self {
            MxDialect::Word => b"w:rPr",
            MxDialect::Drawing => b"a:rPr",
        }
    }

    /// Serialises a text element holding `text`.
    pub fn text_element(self, text: &str) -> String {
        match self {
            MxDialect::Word => format!("<w:t xml:space=\"preserve\">{}</w:t>", escape(text)),
            MxDialect::Drawing => format!("<a:t>{}</a:t>", escape(text)),
        }
    }
}

/// One text element of a paragraph.
#[derive(Clone, Debug, PartialEq)]
pub struct MxTextNode {
    /// Unescaped text content.
    pub text: String,
    /// Byte range of the whole element, tags included.
    pub element: Range<usize>,
    /// Raw properties of the enclosing run, if it declares any.
    pub run_properties: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MxParagraph {
    pub nodes: Vec<MxTextNode>,
}

impl MxParagraph {
    pub fn texts(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.text.as_str()).collect()
    }
}

#[derive(Default)]
struct RunState {
    depth: usize,
    properties: Option<String>,
    properties_start: Option<usize>,
}

/// Collects the text elements of every paragraph of `xml`, in document
/// order of their closing tags. Paragraphs nested in text boxes are
/// reported separately from their host paragraph.
pub fn scan_paragraphs(part: &str, xml: &str, dialect: MxDialect) -> Result<Vec<MxParagraph>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut open_paragraphs: Vec<MxParagraph> = Vec::new();
    let mut runs: Vec<RunState> = Vec::new();
    let mut depth = 0usize;
    let mut text_start: Option<(usize, usize)> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| MxError::xml(part, e.to_string()))?;
        let after = reader.buffer_position() as usize;
        match event {
            Event::Start(e) => {
                depth += 1;
                let name = e.name();
                if name.as_ref() == dialect.paragraph() {
                    open_paragraphs.push(MxParagraph::default());
                } else if name.as_ref() == dialect.run() {
                    runs.push(RunState {
                        depth,
                        ..RunState::default()
                    });
                } else if name.as_ref() == dialect.run_properties() {
                    if let Some(run) = runs.last_mut().filter(|r| r.depth + 1 == depth) {
                        run.properties_start = Some(before);
                    }
                } else if name.as_ref() == dialect.text() {
                    text_start = Some((before, after));
                }
            }
            Event::End(e) => {
                let name = e.name();
                if name.as_ref() == dialect.paragraph() {
                    if let Some(paragraph) = open_paragraphs.pop() {
                        paragraphs.push(paragraph);
                    }
                } else if name.as_ref() == dialect.run() {
                    runs.pop();
                } else if name.as_ref() == dialect.run_properties() {
                    if let Some(run) = runs.last_mut().filter(|r| r.depth + 1 == depth) {
                        if let Some(start) = run.properties_start.take() {
                            run.properties = Some(xml[start..after].to_string());
                        }
                    }
                } else if name.as_ref() == dialect.text() {
                    if let Some((element_start, content_start)) = text_start.take() {
                        let raw = &xml[content_start..before];
                        let text = unescape(raw)
                            .map_err(|e| MxError::xml(part, e.to_string()))?
                            .into_owned();
                        push_node(
                            &mut open_paragraphs,
                            &runs,
                            MxTextNode {
                                text,
                                element: element_start..after,
                                run_properties: None,
                            },
                        );
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Empty(e) => {
                let name = e.name();
                if name.as_ref() == dialect.run_properties() {
                    if let Some(run) = runs.last_mut().filter(|r| r.depth == depth) {
                        run.properties = Some(xml[before..after].to_string());
                    }
                } else if name.as_ref() == dialect.text() {
                    push_node(
                        &mut open_paragraphs,
                        &runs,
                        MxTextNode {
                            text: String::new(),
                            element: before..after,
                            run_properties: None,
                        },
                    );
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}

fn push_node(paragraphs: &mut [MxParagraph], runs: &[RunState], mut node: MxTextNode) {
    node.run_properties = runs.last().and_then(|r| r.properties.clone());
    if let Some(paragraph) = paragraphs.last_mut() {
        paragraph.nodes.push(node);
    }
}

/// A replacement of one byte range of a part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MxTextEdit {
    pub range: Range<usize>,
    pub replacement: String,
}

/// Applies non-overlapping edits to `xml`.
pub fn apply_edits(part: &str, xml: &str, mut edits: Vec<MxTextEdit>) -> Result<String> {
    edits.sort_by_key(|e| e.range.start);
    for pair in edits.windows(2) {
        if pair[0].range.end > pair[1].range.start {
            return Err(MxError::xml(part, "overlapping text edits"));
        }
    }
    let mut out = xml.to_string();
    for edit in edits.iter().rev() {
        out.replace_range(edit.range.clone(), &edit.replacement);
    }
    Ok(out)
}

/// True for characters XML 1.0 cannot carry.
pub fn is_xml_illegal(ch: char) -> bool {
    matches!(ch, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = concat!(
        r#"<w:document xmlns:w="w"><w:body>"#,
        r#"<w:p><w:pPr><w:rPr><w:b/></w:rPr></w:pPr>"#,
        r#"<w:r><w:rPr><w:i/></w:rPr><w:t>Hello {{ na</w:t></w:r>"#,
        r#"<w:r><w:t xml:space="preserve">me }} &amp; co</w:t><w:t/></w:r></w:p>"#,
        r#"</w:body></w:document>"#
    );

    #[test]
    fn scans_text_nodes_with_ranges() {
        let paragraphs = scan_paragraphs("doc", DOC, MxDialect::Word).unwrap();
        assert_eq!(paragraphs.len(), 1);
        let p = &paragraphs[0];
        assert_eq!(p.texts(), vec!["Hello {{ na", "me }} & co", ""]);
        assert_eq!(&DOC[p.nodes[0].element.clone()], "<w:t>Hello {{ na</w:t>");
        assert_eq!(p.nodes[0].run_properties.as_deref(), Some("<w:rPr><w:i/></w:rPr>"));
        assert_eq!(p.nodes[1].run_properties, None);
    }

    #[test]
    fn edits_splice_back_to_front() {
        let paragraphs = scan_paragraphs("doc", DOC, MxDialect::Word).unwrap();
        let nodes = &paragraphs[0].nodes;
        let edits = vec![
            MxTextEdit {
                range: nodes[1].element.clone(),
                replacement: MxDialect::Word.text_element(" & co"),
            },
            MxTextEdit {
                range: nodes[0].element.clone(),
                replacement: MxDialect::Word.text_element("Hello Ada"),
            },
        ];
        let out = apply_edits("doc", DOC, edits).unwrap();
        let again = scan_paragraphs("doc", &out, MxDialect::Word).unwrap();
        assert_eq!(again[0].texts(), vec!["Hello Ada", " & co", ""]);
    }

    #[test]
    fn control_characters_are_illegal() {
        assert!(is_xml_illegal('\u{1}'));
        assert!(!is_xml_illegal('\n'));
        assert!(!is_xml_illegal('é'));
    }
}
