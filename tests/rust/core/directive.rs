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

//! # Merx Directive Tests
//!
//! Placeholder parsing, category dispatch and pipeline execution against a
//! data row.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test directive
//! ```

use merx::locale::{EN_US, PT_BR};
use merx::pipeline::evaluate_text;
use merx::{MxCategory, MxCellValue, MxDataRow, MxDirectiveParser, MxError};

fn client_row() -> MxDataRow {
    MxDataRow::from_pairs(
        0,
        vec![
            ("client", MxCellValue::Text("  acme  ".into())),
            ("total", MxCellValue::Text("1.234,5".into())),
            ("status", MxCellValue::Text("A".into())),
            ("signed", MxCellValue::Text("sim".into())),
            ("seq", MxCellValue::Number(7.0)),
        ],
    )
}

fn render(placeholder: &str) -> String {
    let directive = MxDirectiveParser::new().parse_placeholder(placeholder).unwrap();
    evaluate_text(&directive, &client_row(), &PT_BR).unwrap()
}

/// Operations apply left to right, so reordering changes the result.
#[test]
fn test_pipeline_order_matters() {
    let forward = render("client | format_string(trim, upper, prefix, 'ID: ')");
    let reordered = render("client | format_string(prefix, 'ID: ', trim, upper)");
    assert_eq!(forward, "ID: ACME");
    assert_ne!(forward, reordered);
    assert_eq!(reordered, "ID:   ACME");
}

/// A bare placeholder passes the raw value through.
#[test]
fn test_passthrough_and_missing_variable() {
    assert_eq!(render(" client "), "  acme  ");
    assert_eq!(render("nobody | format_string(upper)"), "");
}

/// The currency dispatcher prepends a currency step using the default code.
#[test]
fn test_currency_dispatch_uses_default_code() {
    assert_eq!(render("total | format_currency()"), "R$\u{a0}1.234,50");
    let parser = MxDirectiveParser::new().default_currency("USD");
    let directive = parser.parse_placeholder("total | currency()").unwrap();
    let text = evaluate_text(&directive, &client_row(), &EN_US).unwrap();
    assert_eq!(text, "$1,234.50");
}

/// The int dispatcher truncates and pads when given a width spec.
#[test]
fn test_int_dispatch_pads() {
    assert_eq!(render("seq | format_int('03d')"), "007");
    let pipeline = MxDirectiveParser::new().parse_directive("format_int()").unwrap();
    assert_eq!(pipeline.operation_names(), vec!["int"]);
    assert_eq!(pipeline.category, MxCategory::Number);
}

/// Logic mappings and booleans read like the source column.
#[test]
fn test_logic_and_boolean_directives() {
    assert_eq!(render("status | format_logic('A=Approved', 'R=Rejected')"), "Approved");
    assert_eq!(render("missing | format_logic('default', 'Pending')"), "Pending");
    assert_eq!(render("signed | format_bool(bool, 'Yes', 'No')"), "Yes");
}

/// Unknown operations, short argument lists and double pipes are rejected.
#[test]
fn test_parse_errors() {
    let parser = MxDirectiveParser::new();
    assert!(matches!(
        parser.parse_placeholder("x | format_string(shout)"),
        Err(MxError::UnknownOperation { .. })
    ));
    assert!(matches!(
        parser.parse_placeholder("x | format_string(prefix)"),
        Err(MxError::ArityMismatch { expected: 1, found: 0, .. })
    ));
    assert!(matches!(
        parser.parse_placeholder("x | format_string(upper) | format_string(lower)"),
        Err(MxError::DirectiveSyntax { .. })
    ));
    assert!(matches!(
        parser.parse_placeholder("x | format_nothing()"),
        Err(MxError::UnknownOperation { .. })
    ));
    assert!(parser.parse_placeholder("x | format_image(1, 2, 3)").is_err());
}

/// Directive errors are classified as such.
#[test]
fn test_directive_errors_are_flagged() {
    let err = MxDirectiveParser::new()
        .parse_placeholder("x | format_number(float)")
        .unwrap_err();
    assert!(err.is_directive_error());
}
