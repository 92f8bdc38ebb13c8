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

//! Date operations. Inputs are read through
//! [`date_value`](crate::operator::date_value); values that do not read as
//! dates pass through unchanged.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta};

use crate::errors::Result;
use crate::locale::MxLocale;
use crate::operator::{date_value, integer_arg, MxOperation, MxValue};

pub static OPERATIONS: &[MxOperation] = &[
    MxOperation::new("iso", 0, iso),
    MxOperation::new("year", 0, year),
    MxOperation::new("short", 1, short),
    MxOperation::new("medium", 1, medium),
    MxOperation::new("long", 1, long),
    MxOperation::new("full", 1, full),
    MxOperation::new("month_name", 1, month_name),
    MxOperation::checked("fmt", 1, fmt, check_pattern),
    MxOperation::checked("add_days", 1, add_days, check_offset),
    MxOperation::checked("add_years", 1, add_years, check_offset),
];

fn with_date(value: MxValue, f: impl FnOnce(NaiveDateTime) -> MxValue) -> Result<MxValue> {
    match date_value(&value) {
        Some(dt) => Ok(f(dt)),
        None => Ok(value),
    }
}

/// Explicit locale argument, or the active locale when it is blank or unknown.
fn target_locale<'a>(args: &[String], active: &'a MxLocale) -> &'a MxLocale {
    args.first()
        .and_then(|tag| MxLocale::resolve(tag))
        .unwrap_or(active)
}

fn iso(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    with_date(value, |dt| MxValue::Text(dt.date().format("%Y-%m-%d").to_string()))
}

fn year(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    with_date(value, |dt| MxValue::Text(dt.year().to_string()))
}

fn month_of(locale: &MxLocale, date: NaiveDate) -> &'static str {
    locale.months[date.month0() as usize]
}

fn short(value: MxValue, args: &[String], locale: &MxLocale) -> Result<MxValue> {
    let locale = target_locale(args, locale);
    with_date(value, |dt| {
        let d = dt.date();
        let text = match locale.language {
            "en" => format!("{}/{}/{:02}", d.month(), d.day(), d.year() % 100),
            "es" => format!("{}/{}/{:02}", d.day(), d.month(), d.year() % 100),
            _ => d.format("%d/%m/%Y").to_string(),
        };
        MxValue::Text(text)
    })
}

fn medium(value: MxValue, args: &[String], locale: &MxLocale) -> Result<MxValue> {
    let locale = target_locale(args, locale);
    with_date(value, |dt| {
        let d = dt.date();
        let abbr = locale.months_abbr[d.month0() as usize];
        let text = match locale.language {
            "en" => format!("{} {}, {}", abbr, d.day(), d.year()),
            "es" => format!("{} {} {}", d.day(), abbr, d.year()),
            _ => format!("{} de {} de {}", d.day(), abbr, d.year()),
        };
        MxValue::Text(text)
    })
}

fn long_text(locale: &MxLocale, d: NaiveDate) -> String {
    match locale.language {
        "en" => format!("{} {}, {}", month_of(locale, d), d.day(), d.year()),
        _ => format!("{} de {} de {}", d.day(), month_of(locale, d), d.year()),
    }
}

fn long(value: MxValue, args: &[String], locale: &MxLocale) -> Result<MxValue> {
    let locale = target_locale(args, locale);
    with_date(value, |dt| MxValue::Text(long_text(locale, dt.date())))
}

fn full(value: MxValue, args: &[String], locale: &MxLocale) -> Result<MxValue> {
    let locale = target_locale(args, locale);
    with_date(value, |dt| {
        let d = dt.date();
        let weekday = locale.weekdays[d.weekday().num_days_from_monday() as usize];
        MxValue::Text(format!("{}, {}", weekday, long_text(locale, d)))
    })
}

fn month_name(value: MxValue, args: &[String], locale: &MxLocale) -> Result<MxValue> {
    let locale = target_locale(args, locale);
    with_date(value, |dt| {
        let name = month_of(locale, dt.date());
        let mut chars = name.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        MxValue::Text(capitalized)
    })
}

/// strftime patterns are rejected up front when chrono cannot render them.
fn check_pattern(args: &[String]) -> std::result::Result<(), String> {
    if StrftimeItems::new(&args[0]).any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid date pattern '{}'", args[0]));
    }
    Ok(())
}

/// Items a naive date cannot supply, such as `%z`, leave the value unchanged.
fn fmt(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    if check_pattern(args).is_err() {
        return Ok(value);
    }
    let Some(dt) = date_value(&value) else {
        return Ok(value);
    };
    let mut text = String::new();
    if write!(text, "{}", dt.format(&args[0])).is_err() {
        log::warn!("date pattern '{}' cannot render a date without an offset", args[0]);
        return Ok(value);
    }
    Ok(MxValue::Text(text))
}

fn check_offset(args: &[String]) -> std::result::Result<(), String> {
    integer_arg(args, 0).map(|_| ())
}

fn add_days(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    let days = args[0].trim().parse::<i64>().unwrap_or(0);
    let shifted = date_value(&value).and_then(|dt| {
        TimeDelta::try_days(days).and_then(|delta| dt.checked_add_signed(delta))
    });
    Ok(shifted.map(MxValue::Date).unwrap_or(value))
}

/// Shifts by whole years; Feb 29 lands on Feb 28 in non-leap years.
fn add_years(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    let years = args[0].trim().parse::<i32>().unwrap_or(0);
    with_date(value, |dt| {
        let months = Months::new(years.unsigned_abs().saturating_mul(12));
        let shifted = if years >= 0 {
            dt.checked_add_months(months)
        } else {
            dt.checked_sub_months(months)
        };
        MxValue::Date(shifted.unwrap_or(dt))
    })
}
