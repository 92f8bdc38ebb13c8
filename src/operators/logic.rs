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

//! Conditional operations: fallbacks, blanking and value mapping.
//!
//! A `key=value` entry in a logic directive becomes a `when` step. Steps run
//! in order like any other pipeline, so a later mapping sees the output of an
//! earlier one.

use crate::errors::Result;
use crate::locale::MxLocale;
use crate::operator::{MxOperation, MxValue};

pub static OPERATIONS: &[MxOperation] = &[
    MxOperation::new("default", 1, default),
    MxOperation::new("empty_if", 1, empty_if),
    MxOperation::new("when", 2, when),
];

/// Replaces an empty value with the fallback; anything else passes through.
fn default(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    if value.is_empty() {
        return Ok(MxValue::Text(args[0].clone()));
    }
    Ok(value)
}

fn empty_if(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    if value.to_text() == args[0] {
        return Ok(MxValue::Empty);
    }
    Ok(value)
}

fn when(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    if value.to_text().trim() == args[0].trim() {
        return Ok(MxValue::Text(args[1].clone()));
    }
    Ok(value)
}
