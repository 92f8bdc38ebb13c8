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

//! # Merx Operator Module
//!
//! An operation is one pure formatting step: it takes the current pipeline
//! value, its fixed list of string arguments and the active locale, and
//! yields the next value. Operations never touch rows, templates or the
//! filesystem, so the same step over the same input always produces the same
//! output.
//!
//! Operations live in static per-category tables (see [`crate::operators`])
//! and are looked up through [`crate::registry`]. Each entry declares its
//! arity, which the directive parser uses to split a flat argument list into
//! steps.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::{MxError, Result};
use crate::locale::MxLocale;
use crate::record::{format_plain_number, MxCellValue};

/// Size request carried by an image placeholder, in centimetres.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MxImageSpec {
    pub filename: String,
    pub width_cm: Option<f64>,
    pub height_cm: Option<f64>,
}

/// Value flowing between the steps of a formatting pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum MxValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Image(MxImageSpec),
}

impl MxValue {
    pub fn from_cell(cell: &MxCellValue) -> Self {
        match cell {
            MxCellValue::Empty => MxValue::Empty,
            MxCellValue::Bool(b) => MxValue::Bool(*b),
            MxCellValue::Number(n) => MxValue::Number(*n),
            MxCellValue::Date(d) => MxValue::Date(d.and_hms_opt(0, 0, 0).unwrap_or_default()),
            MxCellValue::DateTime(dt) => MxValue::Date(*dt),
            MxCellValue::Text(s) => MxValue::Text(s.clone()),
        }
    }

    /// Empty values and whitespace-only text count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            MxValue::Empty => true,
            MxValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Final text of the value. Dates never formatted explicitly render as
    /// ISO dates.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    pub fn text(s: impl Into<String>) -> Self {
        MxValue::Text(s.into())
    }
}

impl fmt::Display for MxValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MxValue::Empty => Ok(()),
            MxValue::Text(s) => f.write_str(s),
            MxValue::Number(n) => f.write_str(&format_plain_number(*n)),
            MxValue::Bool(b) => write!(f, "{}", b),
            MxValue::Date(dt) => write!(f, "{}", dt.date().format("%Y-%m-%d")),
            MxValue::Image(spec) => f.write_str(&spec.filename),
        }
    }
}

/// Signature shared by every operation.
pub type MxOperationFn = fn(MxValue, &[String], &MxLocale) -> Result<MxValue>;

/// Optional argument check run when a directive is parsed.
pub type MxArgumentCheck = fn(&[String]) -> std::result::Result<(), String>;

/// One entry of a category's operation table.
pub struct MxOperation {
    pub name: &'static str,
    pub arity: usize,
    pub apply: MxOperationFn,
    pub check: Option<MxArgumentCheck>,
}

impl MxOperation {
    pub const fn new(name: &'static str, arity: usize, apply: MxOperationFn) -> Self {
        MxOperation {
            name,
            arity,
            apply,
            check: None,
        }
    }

    pub const fn checked(
        name: &'static str,
        arity: usize,
        apply: MxOperationFn,
        check: MxArgumentCheck,
    ) -> Self {
        MxOperation {
            name,
            arity,
            apply,
            check: Some(check),
        }
    }
}

impl fmt::Debug for MxOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MxOperation")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Executes an operation, tagging any failure with the operation name.
pub fn execute_operation(
    operation: &MxOperation,
    value: MxValue,
    args: &[String],
    locale: &MxLocale,
) -> Result<MxValue> {
    (operation.apply)(value, args, locale)
        .map_err(|err| MxError::internal(format!("operation '{}': {}", operation.name, err)))
}

/// Parses an argument as an integer, for argument checks.
pub fn integer_arg(args: &[String], idx: usize) -> std::result::Result<i64, String> {
    let raw = args.get(idx).map(|s| s.trim()).unwrap_or_default();
    raw.parse::<i64>()
        .map_err(|_| format!("expected an integer argument, found '{}'", raw))
}

/// Best-effort numeric reading of a pipeline value.
///
/// Text is normalised before parsing: everything except digits, signs,
/// separators and exponents is dropped, then separators are disambiguated.
/// With both `.` and `,` present the rightmost one is the decimal mark; a
/// single kind of separator is a decimal mark only when it appears once.
pub fn numeric_value(value: &MxValue) -> Option<f64> {
    match value {
        MxValue::Number(n) => Some(*n),
        MxValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        MxValue::Text(s) => parse_number_text(s),
        _ => None,
    }
}

pub fn parse_number_text(raw: &str) -> Option<f64> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | ',' | 'e' | 'E'))
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let last_dot = kept.rfind('.');
    let last_comma = kept.rfind(',');
    let normalized = match (last_dot, last_comma) {
        (Some(d), Some(c)) if c > d => kept.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => kept.replace(',', ""),
        (None, Some(_)) if kept.matches(',').count() == 1 => kept.replace(',', "."),
        (None, Some(_)) => kept.replace(',', ""),
        (Some(_), None) if kept.matches('.').count() > 1 => kept.replace('.', ""),
        _ => kept,
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Best-effort date reading of a pipeline value.
pub fn date_value(value: &MxValue) -> Option<NaiveDateTime> {
    match value {
        MxValue::Date(dt) => Some(*dt),
        MxValue::Text(s) => parse_date_text(s),
        _ => None,
    }
}

pub fn parse_date_text(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim().trim_end_matches('Z');
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(dt.naive_local());
    }
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
