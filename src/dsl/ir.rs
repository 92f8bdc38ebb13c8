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

//! Parsed directive forms.

use std::fmt;

use crate::operator::MxOperation;
use crate::registry::MxCategory;

/// One operation bound to exactly `operation.arity` arguments.
#[derive(Clone, Debug)]
pub struct MxStep {
    pub operation: &'static MxOperation,
    pub args: Vec<String>,
}

/// Ordered operations of a single category.
#[derive(Clone, Debug)]
pub struct MxPipeline {
    pub category: MxCategory,
    pub steps: Vec<MxStep>,
}

impl MxPipeline {
    pub fn new(category: MxCategory) -> Self {
        MxPipeline {
            category,
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, operation: &'static MxOperation, args: Vec<String>) {
        self.steps.push(MxStep { operation, args });
    }

    pub fn is_image(&self) -> bool {
        self.category == MxCategory::Image
    }

    /// Step names in execution order.
    pub fn operation_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.operation.name).collect()
    }
}

impl fmt::Display for MxPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.category)?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(step.operation.name)?;
            if !step.args.is_empty() {
                write!(f, " {:?}", step.args)?;
            }
        }
        f.write_str(")")
    }
}

/// A placeholder's parsed form: the variable plus an optional pipeline.
/// Without a pipeline the raw value is substituted as-is.
#[derive(Clone, Debug)]
pub struct MxDirective {
    pub variable: String,
    pub pipeline: Option<MxPipeline>,
}

impl MxDirective {
    pub fn passthrough(variable: impl Into<String>) -> Self {
        MxDirective {
            variable: variable.into(),
            pipeline: None,
        }
    }

    pub fn is_image(&self) -> bool {
        self.pipeline.as_ref().map(MxPipeline::is_image).unwrap_or(false)
    }
}
