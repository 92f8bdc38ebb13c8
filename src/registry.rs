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

//! # Merx Strategy Registry
//!
//! Closed set of formatting categories. A directive names a category through
//! a dispatcher (`format_string`, `string`, `text`, ...); the dispatcher
//! resolves to a category plus any implicit leading steps, and operations are
//! then looked up by name in that category's static table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operator::MxOperation;
use crate::operators;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MxCategory {
    String,
    Number,
    Date,
    Logic,
    Boolean,
    Mask,
    Image,
}

impl MxCategory {
    pub const ALL: [MxCategory; 7] = [
        MxCategory::String,
        MxCategory::Number,
        MxCategory::Date,
        MxCategory::Logic,
        MxCategory::Boolean,
        MxCategory::Mask,
        MxCategory::Image,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MxCategory::String => "string",
            MxCategory::Number => "number",
            MxCategory::Date => "date",
            MxCategory::Logic => "logic",
            MxCategory::Boolean => "boolean",
            MxCategory::Mask => "mask",
            MxCategory::Image => "image",
        }
    }

    pub fn operations(self) -> &'static [MxOperation] {
        match self {
            MxCategory::String => operators::string::OPERATIONS,
            MxCategory::Number => operators::number::OPERATIONS,
            MxCategory::Date => operators::date::OPERATIONS,
            MxCategory::Logic => operators::logic::OPERATIONS,
            MxCategory::Boolean => operators::boolean::OPERATIONS,
            MxCategory::Mask => operators::mask::OPERATIONS,
            MxCategory::Image => operators::image::OPERATIONS,
        }
    }

    /// Case-insensitive lookup of an operation in this category.
    pub fn lookup(self, name: &str) -> Option<&'static MxOperation> {
        let name = name.trim();
        self.operations()
            .iter()
            .find(|op| op.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for MxCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Implicit rewrite a dispatcher applies to its argument list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MxDispatchKind {
    /// Arguments are the operation chain as written.
    Plain,
    /// `format_currency(code?)`: one `currency` step, code defaults to config.
    Currency,
    /// `format_int(spec?)`: `int`, then `pad spec` when a spec is given.
    Int,
    /// `format_image(width?, height?)`: one `size` step.
    Image,
}

/// Resolved dispatcher name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MxDispatcher {
    pub category: MxCategory,
    pub kind: MxDispatchKind,
}

const DISPATCHERS: &[(&str, MxCategory, MxDispatchKind)] = &[
    ("format_string", MxCategory::String, MxDispatchKind::Plain),
    ("string", MxCategory::String, MxDispatchKind::Plain),
    ("text", MxCategory::String, MxDispatchKind::Plain),
    ("format_number", MxCategory::Number, MxDispatchKind::Plain),
    ("number", MxCategory::Number, MxDispatchKind::Plain),
    ("numeric", MxCategory::Number, MxDispatchKind::Plain),
    ("format_currency", MxCategory::Number, MxDispatchKind::Currency),
    ("currency", MxCategory::Number, MxDispatchKind::Currency),
    ("format_int", MxCategory::Number, MxDispatchKind::Int),
    ("int", MxCategory::Number, MxDispatchKind::Int),
    ("format_date", MxCategory::Date, MxDispatchKind::Plain),
    ("date", MxCategory::Date, MxDispatchKind::Plain),
    ("format_logic", MxCategory::Logic, MxDispatchKind::Plain),
    ("logic", MxCategory::Logic, MxDispatchKind::Plain),
    ("conditional", MxCategory::Logic, MxDispatchKind::Plain),
    ("format_bool", MxCategory::Boolean, MxDispatchKind::Plain),
    ("bool", MxCategory::Boolean, MxDispatchKind::Plain),
    ("boolean", MxCategory::Boolean, MxDispatchKind::Plain),
    ("format_mask", MxCategory::Mask, MxDispatchKind::Plain),
    ("mask", MxCategory::Mask, MxDispatchKind::Plain),
    ("masking", MxCategory::Mask, MxDispatchKind::Plain),
    ("format_image", MxCategory::Image, MxDispatchKind::Image),
    ("image", MxCategory::Image, MxDispatchKind::Image),
];

/// Resolves a dispatcher name, ignoring case.
pub fn dispatcher(name: &str) -> Option<MxDispatcher> {
    let name = name.trim();
    DISPATCHERS
        .iter()
        .find(|(n, _, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, category, kind)| MxDispatcher {
            category: *category,
            kind: *kind,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_operations() {
        for category in MxCategory::ALL {
            assert!(!category.operations().is_empty(), "{category}");
        }
    }

    #[test]
    fn operation_names_are_unique_per_category() {
        for category in MxCategory::ALL {
            let ops = category.operations();
            for (i, op) in ops.iter().enumerate() {
                assert!(ops[i + 1..].iter().all(|o| o.name != op.name), "{}", op.name);
            }
        }
    }

    #[test]
    fn dispatcher_aliases() {
        let d = dispatcher("FORMAT_CURRENCY").unwrap();
        assert_eq!(d.category, MxCategory::Number);
        assert_eq!(d.kind, MxDispatchKind::Currency);
        assert!(dispatcher("format_magic").is_none());
        assert_eq!(MxCategory::String.lookup("UPPER").map(|o| o.arity), Some(0));
    }
}
