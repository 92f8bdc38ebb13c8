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

//! # Merx Error Module
//!
//! This module defines the error types used throughout the Merx engine for
//! consistent error handling and reporting.
//!
//! ## Error Scopes
//!
//! Merx errors fall into three scopes, and the scope decides how far an error
//! is allowed to travel:
//!
//! - **Directive**: `DirectiveSyntax`, `UnknownOperation`, `ArityMismatch`.
//!   Reported by validation. During rendering they degrade to raw-value
//!   passthrough unless strict directives are enabled.
//! - **Row**: `RowRender`, `ConversionTimeout`, `Conversion`. Recovered by the
//!   orchestrator and recorded in the row outcome; the batch continues.
//! - **Batch**: `Orchestrator`, `JobNotFound`, `InvalidTransition` and the
//!   ambient I/O variants. These abort the current operation.
//!
//! ## Usage
//!
//! ```rust
//! use merx::errors::{Result, MxError};
//!
//! fn column(name: &str) -> Result<String> {
//!     if name.is_empty() {
//!         return Err(MxError::validation("column name cannot be empty"));
//!     }
//!     Ok(name.to_string())
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::result::ZipError;

/// Convenience result type used throughout Merx.
pub type Result<T> = std::result::Result<T, MxError>;

/// Canonical error enumeration for Merx.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
pub enum MxError {
    /// A placeholder or directive could not be tokenised.
    #[error("directive syntax error in '{directive}': {message}")]
    DirectiveSyntax { directive: String, message: String },

    /// A directive named an operation its category does not register.
    #[error("unknown operation '{operation}' for category '{category}'")]
    UnknownOperation { category: String, operation: String },

    /// An operation was left with fewer trailing arguments than its arity.
    #[error("operation '{operation}' expects {expected} argument(s), found {found}")]
    ArityMismatch {
        operation: String,
        expected: usize,
        found: usize,
    },

    /// Rendering one template for one row failed.
    #[error("row {row} template '{template}' failed: {message}")]
    RowRender {
        row: usize,
        template: String,
        message: String,
    },

    /// The external converter exceeded its deadline and was terminated.
    #[error("conversion of '{input}' timed out after {seconds}s")]
    ConversionTimeout { input: String, seconds: u64 },

    /// The external converter exited unsuccessfully.
    #[error("conversion of '{input}' failed: {message}")]
    Conversion { input: String, message: String },

    /// A fault that prevents the batch from completing.
    #[error("orchestrator fault: {0}")]
    Orchestrator(String),

    /// No job is registered under the given id.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// A job status update that would move the job backwards.
    #[error("job '{job_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        job_id: String,
        from: String,
        to: String,
    },

    /// Errors originating from filesystem or process IO.
    #[error("io error: {0}")]
    Io(String),

    /// Errors originating from ZIP package operations.
    #[error("zip error: {0}")]
    Zip(String),

    /// Malformed XML inside a document part.
    #[error("xml error in '{part}': {message}")]
    Xml { part: String, message: String },

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Errors raised while reading or writing CSV.
    #[error("csv error: {0}")]
    Csv(String),

    /// Validation errors triggered by invalid parameters or inputs.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for MxError {
    fn from(err: io::Error) -> Self {
        MxError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MxError {
    fn from(err: serde_json::Error) -> Self {
        MxError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for MxError {
    fn from(err: serde_yaml::Error) -> Self {
        MxError::Serde(err.to_string())
    }
}

impl From<ZipError> for MxError {
    fn from(err: ZipError) -> Self {
        MxError::Zip(err.to_string())
    }
}

impl From<quick_xml::Error> for MxError {
    fn from(err: quick_xml::Error) -> Self {
        MxError::Xml {
            part: "unknown".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for MxError {
    fn from(err: csv::Error) -> Self {
        MxError::Csv(err.to_string())
    }
}

impl MxError {
    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        MxError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct directive syntax errors.
    pub fn directive_syntax(directive: impl Into<String>, message: impl Into<String>) -> Self {
        MxError::DirectiveSyntax {
            directive: directive.into(),
            message: message.into(),
        }
    }

    /// Helper to construct unknown operation errors.
    pub fn unknown_operation(category: impl Into<String>, operation: impl Into<String>) -> Self {
        MxError::UnknownOperation {
            category: category.into(),
            operation: operation.into(),
        }
    }

    /// Helper to construct row-scoped render errors.
    pub fn row_render(row: usize, template: impl Into<String>, message: impl Into<String>) -> Self {
        MxError::RowRender {
            row,
            template: template.into(),
            message: message.into(),
        }
    }

    /// Helper to construct XML errors bound to a package part.
    pub fn xml(part: impl Into<String>, message: impl Into<String>) -> Self {
        MxError::Xml {
            part: part.into(),
            message: message.into(),
        }
    }

    /// Helper to construct orchestrator faults.
    pub fn orchestrator<T: Into<String>>(message: T) -> Self {
        MxError::Orchestrator(message.into())
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        MxError::Internal(message.into())
    }

    /// True for errors produced while parsing a directive.
    pub fn is_directive_error(&self) -> bool {
        matches!(
            self,
            MxError::DirectiveSyntax { .. }
                | MxError::UnknownOperation { .. }
                | MxError::ArityMismatch { .. }
        )
    }
}
