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

//! # Operators Module
//!
//! Operation tables for every formatting category. Each submodule exposes a
//! static `OPERATIONS` slice; [`crate::registry::MxCategory`] owns the mapping
//! from category to table.
//!
//! ## Categories
//!
//! - **string**: case, trimming, affixes, truncation
//! - **number**: integers, precision, currency, percent, words
//! - **date**: locale styles, strftime patterns, calendar arithmetic
//! - **logic**: fallbacks, blanking and `key=value` mapping
//! - **boolean**: truthy rendering and check boxes
//! - **mask**: privacy masks and `#` patterns
//! - **image**: display size for image placeholders

pub mod boolean;
pub mod date;
pub mod image;
pub mod logic;
pub mod mask;
pub mod number;
pub mod string;
