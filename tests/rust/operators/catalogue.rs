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

//! # Merx Operator Catalogue Tests
//!
//! One or two representative directives per category, evaluated end to end
//! through the parser.

use merx::locale::{EN_US, PT_BR};
use merx::pipeline::evaluate_text;
use merx::{MxCellValue, MxDataRow, MxDirectiveParser, MxLocale};

fn format_with(value: MxCellValue, directive: &str, locale: &MxLocale) -> String {
    let row = MxDataRow::from_pairs(0, vec![("v", value)]);
    let parsed = MxDirectiveParser::new()
        .parse_placeholder(&format!("v | {}", directive))
        .unwrap();
    evaluate_text(&parsed, &row, locale).unwrap()
}

fn format_text(value: &str, directive: &str) -> String {
    format_with(MxCellValue::Text(value.to_string()), directive, &PT_BR)
}

#[test]
fn test_privacy_masks() {
    assert_eq!(format_text("jane@example.com", "format_mask(email)"), "j***@example.com");
    assert_eq!(
        format_text("4111-1111-1111-9876", "format_mask(credit_card)"),
        "**** **** **** 9876"
    );
    assert_eq!(format_text("Maria Silva", "format_mask(name)"), "M**** S****");
}

/// A token containing `#` is a positional pattern.
#[test]
fn test_positional_mask_pattern() {
    assert_eq!(format_text("12345678909", "format_mask('###.###.###-##')"), "123.456.789-09");
    assert_eq!(format_text("01310100", "format_mask('#####-###')"), "01310-100");
}

#[test]
fn test_dates_in_locale() {
    assert_eq!(format_text("2024-03-05", "format_date(long, 'pt')"), "5 de março de 2024");
    assert_eq!(format_text("2024-03-05", "format_date(long, 'en')"), "March 5, 2024");
    assert_eq!(format_text("05/03/2024", "format_date(short, '')"), "05/03/2024");
    assert_eq!(format_text("2024-03-05", "format_date(add_days, '30', iso)"), "2024-04-04");
    assert_eq!(format_text("2024-03-05", "format_date(fmt, '%d.%m')"), "05.03");
}

/// Values that do not read as dates pass through.
#[test]
fn test_non_date_passthrough() {
    assert_eq!(format_text("soon", "format_date(long, 'pt')"), "soon");
}

#[test]
fn test_numbers() {
    assert_eq!(format_with(MxCellValue::Number(0.256), "format_number(percent)", &PT_BR), "26%");
    assert_eq!(format_with(MxCellValue::Number(1500.0), "format_number(humanize)", &PT_BR), "1.5K");
    assert_eq!(format_with(MxCellValue::Number(22.0), "format_number(ordinal)", &EN_US), "22nd");
    assert_eq!(
        format_with(MxCellValue::Number(121.0), "format_number(spell_out)", &EN_US),
        "one hundred and twenty-one"
    );
    assert_eq!(format_with(MxCellValue::Number(3.14159), "format_number(float, '2')", &PT_BR), "3.14");
}

#[test]
fn test_int_truncates_then_pads() {
    assert_eq!(format_with(MxCellValue::Number(42.9), "format_int()", &PT_BR), "42");
    assert_eq!(format_with(MxCellValue::Number(42.9), "format_int('05d')", &PT_BR), "00042");
}

/// Mixed separators are read by the position of the last one.
#[test]
fn test_currency_reads_either_separator_style() {
    assert_eq!(format_text("1,234.50", "format_currency('BRL')"), "R$\u{a0}1.234,50");
    assert_eq!(format_text("1.234,50", "format_currency('BRL')"), "R$\u{a0}1.234,50");
    assert_eq!(
        format_with(MxCellValue::Text("99,9".into()), "format_currency('USD')", &EN_US),
        "$99.90"
    );
}

#[test]
fn test_logic_default_and_mapping() {
    assert_eq!(format_text("", "format_logic(default, 'N/A')"), "N/A");
    assert_eq!(format_text("B", "format_logic('A=Approved', 'B=Blocked')"), "Blocked");
    assert_eq!(format_text("C", "format_logic('A=Approved', 'B=Blocked')"), "C");
}

#[test]
fn test_boolean_check_marks() {
    assert_eq!(format_with(MxCellValue::Bool(true), "format_bool(check)", &PT_BR), "☑");
    assert_eq!(format_with(MxCellValue::Bool(false), "format_bool(check)", &PT_BR), "☐");
}

#[test]
fn test_string_chain() {
    assert_eq!(format_text("  hello world ", "format_string(trim, upper)"), "HELLO WORLD");
    assert_eq!(format_text("abc", "format_string(suffix, '!')"), "abc!");
}
