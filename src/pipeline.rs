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

//! # Merx Pipeline Module
//!
//! Execution of parsed pipelines. Steps run strictly left to right and each
//! step's output is the next step's input. Execution is pure: it reads the
//! row and the locale tables and nothing else.

use crate::dsl::ir::{MxDirective, MxPipeline};
use crate::errors::Result;
use crate::locale::MxLocale;
use crate::operator::{execute_operation, MxValue};
use crate::record::MxDataRow;

/// Runs every step of `pipeline` over `value`.
pub fn apply(pipeline: &MxPipeline, mut value: MxValue, locale: &MxLocale) -> Result<MxValue> {
    for step in &pipeline.steps {
        value = execute_operation(step.operation, value, &step.args, locale)?;
    }
    Ok(value)
}

/// Resolves a directive against a row. A column missing from the row reads
/// as an empty value; without a pipeline the raw value is returned as is.
pub fn evaluate(directive: &MxDirective, row: &MxDataRow, locale: &MxLocale) -> Result<MxValue> {
    let raw = row
        .get(&directive.variable)
        .map(MxValue::from_cell)
        .unwrap_or(MxValue::Empty);
    match &directive.pipeline {
        Some(pipeline) => apply(pipeline, raw, locale),
        None => Ok(raw),
    }
}

/// Text form of [`evaluate`].
pub fn evaluate_text(directive: &MxDirective, row: &MxDataRow, locale: &MxLocale) -> Result<String> {
    evaluate(directive, row, locale).map(|v| v.to_text())
}
