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

//! String operations: case, trimming, affixes and slug-style rewrites.

use crate::errors::Result;
use crate::locale::MxLocale;
use crate::operator::{integer_arg, MxOperation, MxValue};

pub static OPERATIONS: &[MxOperation] = &[
    MxOperation::new("upper", 0, upper),
    MxOperation::new("uppercase", 0, upper),
    MxOperation::new("lower", 0, lower),
    MxOperation::new("lowercase", 0, lower),
    MxOperation::new("title", 0, title),
    MxOperation::new("capitalize", 0, capitalize),
    MxOperation::new("swapcase", 0, swapcase),
    MxOperation::new("trim", 0, trim),
    MxOperation::new("reverse", 0, reverse),
    MxOperation::new("snake", 0, snake),
    MxOperation::new("kebab", 0, kebab),
    MxOperation::new("slug", 0, slug),
    MxOperation::new("prefix", 1, prefix),
    MxOperation::new("suffix", 1, suffix),
    MxOperation::checked("truncate", 1, truncate, check_truncate),
];

fn text_of(value: &MxValue) -> String {
    value.to_text()
}

fn upper(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    Ok(MxValue::Text(text_of(&value).to_uppercase()))
}

fn lower(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    Ok(MxValue::Text(text_of(&value).to_lowercase()))
}

/// Upper-cases the first letter of every alphabetic run.
fn title(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    let mut out = String::new();
    let mut prev_alpha = false;
    for ch in text_of(&value).chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    Ok(MxValue::Text(out))
}

fn capitalize(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    let text = text_of(&value);
    let mut chars = text.chars();
    let out = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    Ok(MxValue::Text(out))
}

fn swapcase(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    let out = text_of(&value)
        .chars()
        .flat_map(|c| {
            if c.is_uppercase() {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                c.to_uppercase().collect::<Vec<_>>()
            }
        })
        .collect();
    Ok(MxValue::Text(out))
}

fn trim(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    Ok(MxValue::Text(text_of(&value).trim().to_string()))
}

fn reverse(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    Ok(MxValue::Text(text_of(&value).chars().rev().collect()))
}

/// Splits on non-alphanumerics and lower/upper boundaries.
fn words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in text.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn snake(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    Ok(MxValue::Text(words(&text_of(&value)).join("_")))
}

fn kebab(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    Ok(MxValue::Text(words(&text_of(&value)).join("-")))
}

/// Drops everything but ASCII letters, digits, whitespace and `-`, then
/// joins whitespace runs with `-`. Case boundaries are not split.
fn slug(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    let kept: String = text_of(&value)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();
    Ok(MxValue::Text(kept.split_whitespace().collect::<Vec<_>>().join("-")))
}

fn prefix(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    Ok(MxValue::Text(format!("{}{}", args[0], text_of(&value))))
}

fn suffix(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    Ok(MxValue::Text(format!("{}{}", text_of(&value), args[0])))
}

fn check_truncate(args: &[String]) -> std::result::Result<(), String> {
    match integer_arg(args, 0)? {
        n if n < 0 => Err("truncate length cannot be negative".to_string()),
        _ => Ok(()),
    }
}

/// Keeps the first `n` characters and appends `...` when anything was cut.
fn truncate(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    let limit = args[0].trim().parse::<usize>().unwrap_or(usize::MAX);
    let text = text_of(&value);
    if text.chars().count() <= limit {
        return Ok(MxValue::Text(text));
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push_str("...");
    Ok(MxValue::Text(cut))
}
