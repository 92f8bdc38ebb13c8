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

//! # Merx Merge Engine
//!
//! Renders one template against one data row.
//!
//! Every render works on its own copy of the template package: rewritten
//! parts, new media and relationship updates land in the copy, and the
//! shared template is never touched. Placeholders are located after run
//! reunification, substituted inside the run that holds their opening
//! delimiter, and the surrounding runs keep their formatting.
//!
//! ## Images
//!
//! In word-processing templates an image directive names an asset; the
//! placeholder becomes an inline picture sized from the requested
//! centimetres, keeping the aspect ratio when only one side is given.
//! Presentation and plain-text templates receive the file name as text. A
//! missing or unreadable asset fails that placeholder only: the document is
//! still produced with a marker text and the failure is reported.

use image::{GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::assets::MxAssetSet;
use crate::config::MxConfig;
use crate::document::runs::reunify;
use crate::document::text::{apply_edits, is_xml_illegal, scan_paragraphs, MxTextEdit};
use crate::document::{
    text_lines, text_parts, MxDialect, MxPackage, MxParagraph, MxTemplate, MxTemplateBody,
    MxTemplateKind,
};
use crate::dsl::parser::{is_valid_variable, scan_placeholders, MxDirectiveParser, MxPlaceholder};
use crate::errors::{MxError, Result};
use crate::locale::{MxLocale, PT_BR};
use crate::operator::{MxImageSpec, MxValue};
use crate::pipeline;
use crate::record::MxDataRow;

pub const IMAGE_NOT_FOUND: &str = "[IMAGE NOT FOUND]";
pub const IMAGE_INVALID: &str = "[INVALID IMAGE]";

const EMU_PER_CM: f64 = 360_000.0;
const EMU_PER_PIXEL: f64 = 9_525.0;
const IMAGE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// A placeholder that could not be fully honoured.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxPlaceholderFailure {
    pub placeholder: String,
    pub message: String,
}

/// Output of one render.
#[derive(Clone, Debug)]
pub struct MxRenderedDocument {
    pub template: String,
    pub bytes: Vec<u8>,
    pub substitutions: usize,
    pub failures: Vec<MxPlaceholderFailure>,
}

enum Resolved {
    Text(String),
    Image(MxImageSpec),
    /// Unparseable directive over an unusable name; the text stays as written.
    Keep,
}

enum Segment {
    Text(String),
    Drawing(String),
}

/// Per-render mutable state.
struct RenderState<'a> {
    row: &'a MxDataRow,
    template: &'a str,
    assets: Option<&'a MxAssetSet>,
    substitutions: usize,
    failures: Vec<MxPlaceholderFailure>,
}

#[derive(Clone, Debug)]
pub struct MxMergeEngine {
    parser: MxDirectiveParser,
    locale: &'static MxLocale,
    strict: bool,
}

impl Default for MxMergeEngine {
    fn default() -> Self {
        MxMergeEngine {
            parser: MxDirectiveParser::new(),
            locale: &PT_BR,
            strict: false,
        }
    }
}

impl MxMergeEngine {
    pub fn new(locale: &'static MxLocale) -> Self {
        MxMergeEngine {
            locale,
            ..Self::default()
        }
    }

    pub fn from_config(config: &MxConfig) -> Self {
        MxMergeEngine {
            parser: MxDirectiveParser::new().default_currency(config.default_currency.clone()),
            locale: config.resolved_locale(),
            strict: config.strict_directives,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn locale(&self) -> &'static MxLocale {
        self.locale
    }

    /// Renders `template` for `row`. Errors are scoped to this (row,
    /// template) pair and reported as [`MxError::RowRender`].
    pub fn render(
        &self,
        template: &MxTemplate,
        row: &MxDataRow,
        assets: Option<&MxAssetSet>,
    ) -> Result<MxRenderedDocument> {
        let mut state = RenderState {
            row,
            template: &template.name,
            assets,
            substitutions: 0,
            failures: Vec::new(),
        };
        let bytes = match &template.body {
            MxTemplateBody::Text(text) => self.render_text(text, &mut state)?.into_bytes(),
            MxTemplateBody::Package(source) => {
                let mut package = source.clone();
                self.render_package(template.kind, &mut package, &mut state)?;
                package.strip_thumbnail()?;
                package.to_bytes()?
            }
        };
        if !state.failures.is_empty() {
            log::warn!(
                "row {} template '{}': {} placeholder failure(s)",
                row.index,
                template.name,
                state.failures.len()
            );
        }
        Ok(MxRenderedDocument {
            template: template.name.clone(),
            bytes,
            substitutions: state.substitutions,
            failures: state.failures,
        })
    }

    fn render_text(&self, text: &str, state: &mut RenderState<'_>) -> Result<String> {
        let mut edits = Vec::new();
        for paragraph in text_lines(text) {
            let node = &paragraph.nodes[0];
            let segments = self.substitute(&node.text, None, state)?;
            if let Some(new_text) = plain_text(&segments).filter(|t| *t != node.text) {
                edits.push(MxTextEdit {
                    range: node.element.clone(),
                    replacement: new_text,
                });
            }
        }
        apply_edits(state.template, text, edits)
    }

    fn render_package(
        &self,
        kind: MxTemplateKind,
        package: &mut MxPackage,
        state: &mut RenderState<'_>,
    ) -> Result<()> {
        let Some(dialect) = kind.dialect() else {
            return Ok(());
        };
        for part in text_parts(kind, package) {
            let Some(xml) = package.get_text(&part)? else {
                continue;
            };
            let paragraphs = scan_paragraphs(&part, &xml, dialect)?;
            let mut edits = Vec::new();
            for paragraph in &paragraphs {
                let target = match kind {
                    MxTemplateKind::WordProcessing => Some((&mut *package, part.as_str())),
                    _ => None,
                };
                edits.extend(self.render_paragraph(paragraph, dialect, target, state)?);
            }
            if !edits.is_empty() {
                let rendered = apply_edits(&part, &xml, edits)?;
                package.set_text(&part, rendered);
            }
        }
        Ok(())
    }

    fn render_paragraph(
        &self,
        paragraph: &MxParagraph,
        dialect: MxDialect,
        mut images: Option<(&mut MxPackage, &str)>,
        state: &mut RenderState<'_>,
    ) -> Result<Vec<MxTextEdit>> {
        let texts = paragraph.texts();
        let unified = reunify(&texts);
        let mut edits = Vec::new();
        for (node, text) in paragraph.nodes.iter().zip(unified) {
            let has_placeholder = !scan_placeholders(&text).is_empty();
            if !has_placeholder && text == node.text {
                continue;
            }
            let target = images.as_mut().map(|(pkg, part)| (&mut **pkg, *part));
            let segments = self.substitute(&text, target, state)?;
            for segment in &segments {
                if let Segment::Text(t) = segment {
                    if let Some(bad) = t.chars().find(|c| is_xml_illegal(*c)) {
                        return Err(MxError::row_render(
                            state.row.index,
                            state.template,
                            format!("value contains a character not allowed in XML (U+{:04X})", bad as u32),
                        ));
                    }
                }
            }
            edits.push(MxTextEdit {
                range: node.element.clone(),
                replacement: element_xml(dialect, &segments, node.run_properties.as_deref()),
            });
        }
        Ok(edits)
    }

    /// Replaces every placeholder of `text`. Image directives become
    /// drawings only when `images` carries the package being rendered.
    fn substitute(
        &self,
        text: &str,
        mut images: Option<(&mut MxPackage, &str)>,
        state: &mut RenderState<'_>,
    ) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut buffer = String::new();
        let mut cursor = 0;
        for placeholder in scan_placeholders(text) {
            buffer.push_str(&text[cursor..placeholder.start]);
            cursor = placeholder.end;
            match self.resolve(&placeholder, state)? {
                Resolved::Text(value) => {
                    state.substitutions += 1;
                    buffer.push_str(&value);
                }
                Resolved::Keep => buffer.push_str(&text[placeholder.start..placeholder.end]),
                Resolved::Image(spec) => {
                    state.substitutions += 1;
                    let Some((package, part)) = images.as_mut() else {
                        buffer.push_str(&spec.filename);
                        continue;
                    };
                    match self.place_image(&spec, &mut **package, *part, state) {
                        Ok(drawing) => {
                            segments.push(Segment::Text(std::mem::take(&mut buffer)));
                            segments.push(Segment::Drawing(drawing));
                        }
                        Err(marker) => buffer.push_str(marker),
                    }
                }
            }
        }
        buffer.push_str(&text[cursor..]);
        segments.push(Segment::Text(buffer));
        Ok(segments)
    }

    fn resolve(&self, placeholder: &MxPlaceholder, state: &RenderState<'_>) -> Result<Resolved> {
        let directive = match self.parser.parse_placeholder(&placeholder.inner) {
            Ok(directive) => directive,
            Err(err) if self.strict => {
                return Err(MxError::row_render(state.row.index, state.template, err.to_string()))
            }
            Err(err) => {
                log::warn!(
                    "row {} template '{}': {}; using the raw value",
                    state.row.index,
                    state.template,
                    err
                );
                let name = placeholder.base_name();
                if !is_valid_variable(name) {
                    return Ok(Resolved::Keep);
                }
                let raw = state.row.get(name).map(|c| c.to_string()).unwrap_or_default();
                return Ok(Resolved::Text(raw));
            }
        };
        let value = pipeline::evaluate(&directive, state.row, self.locale)
            .map_err(|err| MxError::row_render(state.row.index, state.template, err.to_string()))?;
        Ok(match value {
            MxValue::Image(spec) => Resolved::Image(spec),
            other => Resolved::Text(other.to_text()),
        })
    }

    /// Adds the asset to the package and returns the drawing markup, or
    /// the marker text to substitute when the asset is unusable.
    fn place_image(
        &self,
        spec: &MxImageSpec,
        package: &mut MxPackage,
        part: &str,
        state: &mut RenderState<'_>,
    ) -> std::result::Result<String, &'static str> {
        let fail = |state: &mut RenderState<'_>, marker: &'static str, message: String| {
            state.failures.push(MxPlaceholderFailure {
                placeholder: spec.filename.clone(),
                message,
            });
            Err(marker)
        };
        let Some(bytes) = state.assets.and_then(|a| a.get(&spec.filename)) else {
            return fail(state, IMAGE_NOT_FOUND, format!("image '{}' not found in assets", spec.filename));
        };
        let probe = match probe_image(bytes) {
            Ok(probe) => probe,
            Err(message) => return fail(state, IMAGE_INVALID, message),
        };
        let (cx, cy) = image_extent(spec, probe.width, probe.height);
        let media_index = next_media_index(package);
        let media_name = format!("merx_image{}.{}", media_index, probe.extension);
        let stored = package
            .add_relationship(part, IMAGE_RELATIONSHIP, &format!("media/{}", media_name))
            .and_then(|rid| {
                package.ensure_default_content_type(probe.extension, probe.mime)?;
                Ok(rid)
            });
        let rid = match stored {
            Ok(rid) => rid,
            Err(err) => return fail(state, IMAGE_INVALID, err.to_string()),
        };
        let media_dir = part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        package.set(&format!("{}/media/{}", media_dir, media_name), bytes.to_vec());
        Ok(drawing_xml(&rid, media_index, &media_name, cx, cy))
    }
}

struct ImageProbe {
    width: u32,
    height: u32,
    extension: &'static str,
    mime: &'static str,
}

fn probe_image(bytes: &[u8]) -> std::result::Result<ImageProbe, String> {
    let format = image::guess_format(bytes).map_err(|e| e.to_string())?;
    let (extension, mime) = match format {
        ImageFormat::Png => ("png", "image/png"),
        ImageFormat::Jpeg => ("jpeg", "image/jpeg"),
        ImageFormat::Gif => ("gif", "image/gif"),
        other => return Err(format!("unsupported image format {:?}", other)),
    };
    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| e.to_string())?;
    let (width, height) = GenericImageView::dimensions(&decoded);
    Ok(ImageProbe {
        width,
        height,
        extension,
        mime,
    })
}

/// Display size in EMU. Both sides given: used as is. One side: the other
/// follows the intrinsic aspect ratio. Neither: intrinsic pixels at 96 dpi.
pub fn image_extent(spec: &MxImageSpec, width_px: u32, height_px: u32) -> (u64, u64) {
    let w_px = f64::from(width_px.max(1));
    let h_px = f64::from(height_px.max(1));
    let (w, h) = match (spec.width_cm, spec.height_cm) {
        (Some(w), Some(h)) => (w * EMU_PER_CM, h * EMU_PER_CM),
        (Some(w), None) => (w * EMU_PER_CM, w * EMU_PER_CM * h_px / w_px),
        (None, Some(h)) => (h * EMU_PER_CM * w_px / h_px, h * EMU_PER_CM),
        (None, None) => (w_px * EMU_PER_PIXEL, h_px * EMU_PER_PIXEL),
    };
    (w.round() as u64, h.round() as u64)
}

fn next_media_index(package: &MxPackage) -> usize {
    package
        .names()
        .filter(|n| n.contains("/media/merx_image"))
        .count()
        + 1
}

fn drawing_xml(rid: &str, id: usize, name: &str, cx: u64, cy: u64) -> String {
    let doc_id = 10_000 + id;
    format!(
        concat!(
            "<w:drawing>",
            "<wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\" ",
            "xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\">",
            "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
            "<wp:docPr id=\"{doc_id}\" name=\"Picture {doc_id}\"/>",
            "<wp:cNvGraphicFramePr>",
            "<a:graphicFrameLocks xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" noChangeAspect=\"1\"/>",
            "</wp:cNvGraphicFramePr>",
            "<a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
            "<a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:nvPicPr><pic:cNvPr id=\"{doc_id}\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>",
            "<pic:blipFill>",
            "<a:blip r:embed=\"{rid}\" ",
            "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"/>",
            "<a:stretch><a:fillRect/></a:stretch>",
            "</pic:blipFill>",
            "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
            "</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"
        ),
        cx = cx,
        cy = cy,
        doc_id = doc_id,
        name = name,
        rid = rid
    )
}

/// Text of a segment list that holds no drawings.
fn plain_text(segments: &[Segment]) -> Option<String> {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(t) => out.push_str(t),
            Segment::Drawing(_) => return None,
        }
    }
    Some(out)
}

/// Markup replacing one text element. A drawing closes the current run and
/// the text after it continues in a new run with the same properties.
fn element_xml(dialect: MxDialect, segments: &[Segment], run_properties: Option<&str>) -> String {
    if let Some(text) = plain_text(segments) {
        return dialect.text_element(&text);
    }
    let props = run_properties.unwrap_or_default();
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(t) => out.push_str(&dialect.text_element(t)),
            Segment::Drawing(drawing) => {
                out.push_str("</w:r><w:r>");
                out.push_str(props);
                out.push_str(drawing);
                out.push_str("</w:r><w:r>");
                out.push_str(props);
            }
        }
    }
    out
}
