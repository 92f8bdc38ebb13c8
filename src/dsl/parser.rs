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

use crate::dsl::ir::{MxDirective, MxPipeline};
use crate::errors::{MxError, Result};
use crate::operators::image::parse_dimension;
use crate::operators::mask::PATTERN_MARKER;
use crate::registry::{dispatcher, MxCategory, MxDispatchKind};

pub const OPEN: &str = "{{";
pub const CLOSE: &str = "}}";

/// A complete `{{ ... }}` span inside a piece of text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MxPlaceholder {
    /// Byte offset of the opening `{{`.
    pub start: usize,
    /// Byte offset just past the closing `}}`.
    pub end: usize,
    /// Text between the delimiters, untrimmed.
    pub inner: String,
}

impl MxPlaceholder {
    /// Variable part of the placeholder, ignoring any pipeline.
    pub fn base_name(&self) -> &str {
        split_filter(&self.inner).0.trim()
    }
}

/// Finds every complete placeholder in `text`, left to right. An unmatched
/// `{{` ends the scan; when several `{{` precede one `}}` the innermost
/// opening wins.
pub fn scan_placeholders(text: &str) -> Vec<MxPlaceholder> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(rel_open) = text[cursor..].find(OPEN) {
        let mut open = cursor + rel_open;
        let Some(rel_close) = text[open + OPEN.len()..].find(CLOSE) else {
            break;
        };
        let close = open + OPEN.len() + rel_close;
        if let Some(inner_open) = text[open + OPEN.len()..close].rfind(OPEN) {
            open = open + OPEN.len() + inner_open;
        }
        found.push(MxPlaceholder {
            start: open,
            end: close + CLOSE.len(),
            inner: text[open + OPEN.len()..close].to_string(),
        });
        cursor = close + CLOSE.len();
    }
    found
}

/// Splits `var | filter` at the first pipe outside quotes.
fn split_filter(inner: &str) -> (&str, Option<&str>) {
    match find_unquoted(inner, '|') {
        Some(idx) => (&inner[..idx], Some(&inner[idx + 1..])),
        None => (inner, None),
    }
}

fn find_unquoted(text: &str, target: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, c) if c == target => return Some(idx),
            _ => {}
        }
    }
    None
}

pub fn is_valid_variable(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// Splits an argument list on commas outside quotes. Quoted arguments keep
/// their inner text verbatim; bare ones are trimmed.
fn split_args(directive: &str, raw: &str) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut quote: Option<char> = None;
    for ch in raw.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '\'' | '"' => {
                    if !current.trim().is_empty() {
                        return Err(MxError::directive_syntax(
                            directive,
                            "quote inside an unquoted argument",
                        ));
                    }
                    current.clear();
                    quoted = true;
                    quote = Some(ch);
                }
                ',' => {
                    args.push(finish_arg(&mut current, &mut quoted));
                }
                c if quoted => {
                    if !c.is_whitespace() {
                        return Err(MxError::directive_syntax(
                            directive,
                            "text after a quoted argument",
                        ));
                    }
                }
                c => current.push(c),
            },
        }
    }
    if quote.is_some() {
        return Err(MxError::directive_syntax(directive, "unterminated quote"));
    }
    args.push(finish_arg(&mut current, &mut quoted));
    Ok(args)
}

fn finish_arg(current: &mut String, quoted: &mut bool) -> String {
    let arg = if *quoted {
        std::mem::take(current)
    } else {
        current.trim().to_string()
    };
    current.clear();
    *quoted = false;
    arg
}

#[derive(Clone, Debug)]
pub struct MxDirectiveParserConfig {
    /// Currency used by `format_currency()` without an explicit code.
    pub default_currency: String,
}

impl Default for MxDirectiveParserConfig {
    fn default() -> Self {
        Self {
            default_currency: "BRL".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MxDirectiveParser {
    config: MxDirectiveParserConfig,
}

impl MxDirectiveParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: MxDirectiveParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn default_currency(mut self, code: impl Into<String>) -> Self {
        self.config.default_currency = code.into();
        self
    }

    /// Parses the inner text of a placeholder (`name | filter(args)`).
    pub fn parse_placeholder(&self, inner: &str) -> Result<MxDirective> {
        let (variable, filter) = split_filter(inner);
        let variable = variable.trim();
        if !is_valid_variable(variable) {
            return Err(MxError::directive_syntax(
                inner.trim(),
                format!("invalid variable name '{}'", variable),
            ));
        }
        let Some(filter) = filter else {
            return Ok(MxDirective::passthrough(variable));
        };
        if find_unquoted(filter, '|').is_some() {
            return Err(MxError::directive_syntax(
                inner.trim(),
                "only one filter is allowed per placeholder",
            ));
        }
        let pipeline = self.parse_directive(filter)?;
        Ok(MxDirective {
            variable: variable.to_string(),
            pipeline: Some(pipeline),
        })
    }

    /// Parses `category(arg, ...)` into a pipeline.
    pub fn parse_directive(&self, text: &str) -> Result<MxPipeline> {
        let text = text.trim();
        let (name, raw_args) = match text.find('(') {
            Some(idx) => {
                if !text.ends_with(')') {
                    return Err(MxError::directive_syntax(text, "missing closing parenthesis"));
                }
                (&text[..idx], &text[idx + 1..text.len() - 1])
            }
            None => (text, ""),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(MxError::directive_syntax(text, "missing category"));
        }
        let dispatch =
            dispatcher(name).ok_or_else(|| MxError::unknown_operation("dispatcher", name))?;
        let args = split_args(text, raw_args)?;
        let mut pipeline = MxPipeline::new(dispatch.category);

        match dispatch.kind {
            MxDispatchKind::Plain => {
                self.push_chain(text, &mut pipeline, &args)?;
            }
            MxDispatchKind::Currency => {
                let (code, rest) = match args.split_first() {
                    Some((code, rest)) if !code.is_empty() => (code.clone(), rest),
                    Some((_, rest)) => (self.config.default_currency.clone(), rest),
                    None => (self.config.default_currency.clone(), &args[..]),
                };
                self.push_step(text, &mut pipeline, "currency", vec![code])?;
                self.push_chain(text, &mut pipeline, rest)?;
            }
            MxDispatchKind::Int => {
                self.push_step(text, &mut pipeline, "int", Vec::new())?;
                let rest = match args.split_first() {
                    Some((spec, rest)) if MxCategory::Number.lookup(spec).is_none() => {
                        self.push_step(text, &mut pipeline, "pad", vec![spec.clone()])?;
                        rest
                    }
                    _ => &args[..],
                };
                self.push_chain(text, &mut pipeline, rest)?;
            }
            MxDispatchKind::Image => {
                if args.len() > 2 {
                    return Err(MxError::ArityMismatch {
                        operation: "size".to_string(),
                        expected: 2,
                        found: args.len(),
                    });
                }
                let mut dims = args.clone();
                dims.resize(2, "auto".to_string());
                for dim in &dims {
                    parse_dimension(dim).map_err(|msg| MxError::directive_syntax(text, msg))?;
                }
                self.push_step(text, &mut pipeline, "size", dims)?;
            }
        }
        Ok(pipeline)
    }

    /// Walks a flat argument list, greedily consuming each operation's arity.
    fn push_chain(&self, directive: &str, pipeline: &mut MxPipeline, args: &[String]) -> Result<()> {
        let category = pipeline.category;
        let mut idx = 0;
        while idx < args.len() {
            let token = &args[idx];
            if category == MxCategory::Logic && category.lookup(token).is_none() {
                if let Some((key, value)) = token.split_once('=') {
                    self.push_step(
                        directive,
                        pipeline,
                        "when",
                        vec![key.trim().to_string(), value.trim().to_string()],
                    )?;
                    idx += 1;
                    continue;
                }
            }
            if category == MxCategory::Mask
                && category.lookup(token).is_none()
                && token.contains(PATTERN_MARKER)
            {
                self.push_step(directive, pipeline, "mask", vec![token.clone()])?;
                idx += 1;
                continue;
            }
            let operation = category
                .lookup(token)
                .ok_or_else(|| MxError::unknown_operation(category.name(), token.as_str()))?;
            let remaining = args.len() - idx - 1;
            if remaining < operation.arity {
                return Err(MxError::ArityMismatch {
                    operation: operation.name.to_string(),
                    expected: operation.arity,
                    found: remaining,
                });
            }
            let bound = args[idx + 1..idx + 1 + operation.arity].to_vec();
            self.push_step(directive, pipeline, operation.name, bound)?;
            idx += 1 + operation.arity;
        }
        Ok(())
    }

    fn push_step(
        &self,
        directive: &str,
        pipeline: &mut MxPipeline,
        name: &str,
        args: Vec<String>,
    ) -> Result<()> {
        let category = pipeline.category;
        let operation = category
            .lookup(name)
            .ok_or_else(|| MxError::unknown_operation(category.name(), name))?;
        if args.len() != operation.arity {
            return Err(MxError::ArityMismatch {
                operation: operation.name.to_string(),
                expected: operation.arity,
                found: args.len(),
            });
        }
        if let Some(check) = operation.check {
            check(&args).map_err(|msg| MxError::directive_syntax(directive, msg))?;
        }
        pipeline.push(operation, args);
        Ok(())
    }
}
