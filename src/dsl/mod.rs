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

//! # Directive Language Module
//!
//! Placeholders embedded in templates carry a small directive language:
//!
//! ```text
//! {{ customer_name }}
//! {{ customer_name | format_string('trim', 'upper', 'prefix', 'ID: ') }}
//! {{ amount | format_currency('USD') }}
//! {{ status | format_logic('A=Approved', 'R=Rejected', 'default', 'Pending') }}
//! {{ photo | format_image(4, 'auto') }}
//! ```
//!
//! ## Architecture
//!
//! - **Parser** ([parser.rs](parser/index.html)): locates placeholders in
//!   text and turns their directive into the IR, consuming each operation's
//!   declared arity from the flat argument list
//! - **IR** ([ir.rs](ir/index.html)): [`MxDirective`] and [`MxPipeline`], the
//!   typed form executed by [`crate::pipeline`]

pub mod ir;
pub mod parser;

pub use ir::{MxDirective, MxPipeline, MxStep};
pub use parser::{scan_placeholders, MxDirectiveParser, MxDirectiveParserConfig, MxPlaceholder};
