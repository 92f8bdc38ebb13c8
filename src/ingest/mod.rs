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

//! # Data Ingestion Module
//!
//! Loads the data source of a batch into a [`MxDataSet`](crate::record::MxDataSet).
//!
//! ## Module Components
//!
//! - **Format Detection** ([format.rs](format/index.html)): format by
//!   extension or content, CSV delimiter sniffing
//! - **Reader** ([reader.rs](reader/index.html)): CSV and JSON loading and
//!   previews
//!
//! ## Supported Input Formats
//!
//! - **CSV**: header row, `,` or `;` delimited, UTF-8 or Latin-1
//! - **JSON**: an array of objects, or a single object; nested objects are
//!   flattened into dotted column names
//! - **JSONL**: one object per line
//!
//! ## Usage
//!
//! ```rust
//! use merx::ingest::MxDataReader;
//!
//! let reader = MxDataReader::new();
//! let data = reader.read_path(&path)?;
//! let preview = reader.preview_path(&path)?;
//! ```

pub mod format;
pub mod reader;

pub use format::{MxDataFormat, MxFormatDetector};
pub use reader::{MxDataPreview, MxDataReader, MxReaderConfig, PREVIEW_ROWS};
