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

//! # Merx Core Library
//!
//! Merx fills office document templates from tabular data. Templates carry
//! `{{ variable | directive }}` placeholders; each directive names a
//! formatting category and a pipeline of operations applied to the raw cell
//! value before it is substituted.
//!
//! ## Module Overview
//!
//! - **record**: data rows and data sets
//! - **ingest**: CSV and JSON data sources, previews
//! - **operator** / **operators** / **registry**: the operation catalogue
//!   grouped in a closed set of categories
//! - **dsl**: placeholder and directive parsing into pipelines
//! - **pipeline**: pipeline execution against a row
//! - **document**: OOXML packages, the paragraph/run text model and run
//!   reunification
//! - **validator**: variable extraction and template/data compatibility
//! - **engine**: rendering of one template for one row
//! - **convert**: PDF conversion behind a bounded gate
//! - **job** / **orchestrator** / **export**: batch runs, their job records
//!   and packaged results
//! - **service**: synchronous and asynchronous entry points
//!
//! ## Quick Start
//!
//! ```rust
//! use merx::{MxDataRow, MxCellValue, MxDirectiveParser, MxLocale};
//!
//! let parser = MxDirectiveParser::new();
//! let directive = parser.parse_placeholder(" name | format_string(trim, upper) ")?;
//! let row = MxDataRow::from_pairs(0, vec![("name", MxCellValue::Text("  acme ".into()))]);
//! let text = merx::pipeline::evaluate_text(&directive, &row, &merx::locale::EN_US)?;
//! assert_eq!(text, "ACME");
//! ```
//!
//! ## Error Handling
//!
//! Every fallible call returns `Result<T, MxError>`. Directive errors are
//! reported by validation, row errors are recorded in the batch outcome and
//! only orchestrator faults fail a batch.

pub mod errors;
pub mod config;
pub mod logging;
pub mod locale;
pub mod record;
pub mod ingest;
pub mod operator;
pub mod operators;
pub mod registry;
pub mod dsl;
pub mod pipeline;
pub mod document;
pub mod assets;
pub mod validator;
pub mod engine;
pub mod convert;
pub mod job;
pub mod orchestrator;
pub mod export;
pub mod service;

pub use errors::{MxError, Result};
pub use config::{MxConfig, MxConfigBuilder, MxConversionConfig};
pub use locale::MxLocale;
pub use record::{MxCellValue, MxDataRow, MxDataSet};
pub use ingest::{MxDataFormat, MxDataPreview, MxDataReader, MxFormatDetector, MxReaderConfig};
pub use operator::{MxImageSpec, MxOperation, MxValue};
pub use registry::{MxCategory, MxDispatchKind, MxDispatcher};
pub use dsl::{MxDirective, MxDirectiveParser, MxDirectiveParserConfig, MxPipeline, MxPlaceholder, MxStep};
pub use document::{MxPackage, MxTemplate, MxTemplateKind};
pub use assets::MxAssetSet;
pub use validator::{MxCompatibilityReport, MxTemplateReport, MxTemplateStatus, MxTemplateVariable};
pub use engine::{MxMergeEngine, MxPlaceholderFailure, MxRenderedDocument};
pub use convert::{MxConversionGate, MxConverter, MxSofficeConverter};
pub use job::{MxJobStatistics, MxJobStatus, MxJobStore, MxJobUpdate, MxOutcomeStatus, MxRenderJob, MxRowOutcome, MxTemplateOutcome};
pub use orchestrator::{MxBatch, MxBatchOptions, MxBatchOrchestrator, MxBatchResult, MxProgressEvent};
pub use export::MxOutputLayout;
pub use service::{MxGenerationRequest, MxJobStatusResponse, MxMergeService, MxOutputFormat, MxUpload};
