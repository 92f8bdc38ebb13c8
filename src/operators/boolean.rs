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

//! Boolean rendering with a lenient truthiness rule.

use crate::errors::Result;
use crate::locale::MxLocale;
use crate::operator::{MxOperation, MxValue};

pub static OPERATIONS: &[MxOperation] = &[
    MxOperation::new("bool", 2, render_bool),
    MxOperation::new("check", 0, check),
];

const TRUTHY: [&str; 8] = ["true", "t", "yes", "y", "1", "s", "sim", "on"];

/// True for boolean true, a non-zero number, or one of the truthy words.
pub fn is_truthy(value: &MxValue) -> bool {
    match value {
        MxValue::Bool(b) => *b,
        MxValue::Number(n) => *n != 0.0,
        MxValue::Text(s) => TRUTHY.contains(&s.trim().to_lowercase().as_str()),
        _ => false,
    }
}

fn render_bool(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    let pick = if is_truthy(&value) { &args[0] } else { &args[1] };
    Ok(MxValue::Text(pick.clone()))
}

fn check(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    let symbol = if is_truthy(&value) { "☑" } else { "☐" };
    Ok(MxValue::text(symbol))
}
