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

//! Privacy masks and positional patterns.

use crate::errors::Result;
use crate::locale::MxLocale;
use crate::operator::{MxOperation, MxValue};

pub static OPERATIONS: &[MxOperation] = &[
    MxOperation::new("mask", 1, pattern),
    MxOperation::new("email", 0, email),
    MxOperation::new("credit_card", 0, credit_card),
    MxOperation::new("name", 0, name),
];

/// Marker replaced by the next input character in a pattern.
pub const PATTERN_MARKER: char = '#';

/// Fills `#` positions with the alphanumerics of the input, in order.
/// Output stops at the first marker with no input left to place.
fn pattern(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    let clean: Vec<char> = value.to_text().chars().filter(|c| c.is_alphanumeric()).collect();
    let mut out = String::new();
    let mut idx = 0;
    for ch in args[0].chars() {
        if ch == PATTERN_MARKER {
            match clean.get(idx) {
                Some(c) => {
                    out.push(*c);
                    idx += 1;
                }
                None => break,
            }
        } else {
            out.push(ch);
        }
    }
    Ok(MxValue::Text(out))
}

fn email(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    let text = value.to_text();
    let Some((user, domain)) = text.split_once('@') else {
        return Ok(MxValue::Text(text));
    };
    let masked = if user.chars().count() > 1 {
        let first: String = user.chars().take(1).collect();
        format!("{}***", first)
    } else {
        user.to_string()
    };
    Ok(MxValue::Text(format!("{}@{}", masked, domain)))
}

fn credit_card(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    let text = value.to_text();
    let digits: Vec<char> = text.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return Ok(MxValue::Text(text));
    }
    let last: String = digits[digits.len() - 4..].iter().collect();
    Ok(MxValue::Text(format!("**** **** **** {}", last)))
}

fn name(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    let masked: Vec<String> = value
        .to_text()
        .split_whitespace()
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) if part.chars().count() > 1 => {
                    let stars = "*".repeat(chars.count());
                    format!("{}{}", first, stars)
                }
                _ => part.to_string(),
            }
        })
        .collect();
    Ok(MxValue::Text(masked.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::PT_BR;

    #[test]
    fn positional_pattern() {
        let args = vec!["###.###.###-##".to_string()];
        let out = pattern(MxValue::text("123.456.789-09"), &args, &PT_BR).unwrap();
        assert_eq!(out.to_text(), "123.456.789-09");
        let out = pattern(MxValue::text("12345678909"), &args, &PT_BR).unwrap();
        assert_eq!(out.to_text(), "123.456.789-09");
        let out = pattern(MxValue::text("1234"), &args, &PT_BR).unwrap();
        assert_eq!(out.to_text(), "123.4");
    }

    #[test]
    fn privacy_masks() {
        let out = email(MxValue::text("j.doe@example.com"), &[], &PT_BR).unwrap();
        assert_eq!(out.to_text(), "j***@example.com");
        let out = credit_card(MxValue::text("4111 1111 1111 1234"), &[], &PT_BR).unwrap();
        assert_eq!(out.to_text(), "**** **** **** 1234");
        let out = name(MxValue::text("John Doe"), &[], &PT_BR).unwrap();
        assert_eq!(out.to_text(), "J*** D**");
    }
}
