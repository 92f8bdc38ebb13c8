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

//! Numeric operations. Inputs are read through
//! [`numeric_value`](crate::operator::numeric_value); anything that does not
//! read as a number passes through unchanged.

use crate::errors::Result;
use crate::locale::{MxCurrencyPlacement, MxLocale};
use crate::operator::{integer_arg, numeric_value, MxOperation, MxValue};

pub static OPERATIONS: &[MxOperation] = &[
    MxOperation::new("int", 0, int),
    MxOperation::new("percent", 0, percent),
    MxOperation::new("scientific", 0, scientific),
    MxOperation::new("humanize", 0, humanize),
    MxOperation::new("ordinal", 0, ordinal),
    MxOperation::new("spell_out", 0, spell_out),
    MxOperation::checked("pad", 1, pad, check_pad),
    MxOperation::checked("float", 1, float, check_precision),
    MxOperation::checked("round", 1, float, check_precision),
    MxOperation::checked("precision", 1, float, check_precision),
    MxOperation::new("currency", 1, currency),
    MxOperation::new("separator", 1, separator),
];

fn with_number(value: MxValue, f: impl FnOnce(f64) -> MxValue) -> Result<MxValue> {
    match numeric_value(&value) {
        Some(n) => Ok(f(n)),
        None => Ok(value),
    }
}

fn int(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    with_number(value, |n| MxValue::Number(n.trunc()))
}

const MAX_PAD_WIDTH: usize = 64;

/// Width from specs such as `4`, `04` or `04d`, at most [`MAX_PAD_WIDTH`].
fn pad_width(spec: &str) -> Option<usize> {
    let digits = spec.trim().trim_end_matches('d');
    digits
        .parse::<usize>()
        .ok()
        .filter(|width| *width <= MAX_PAD_WIDTH)
}

fn check_pad(args: &[String]) -> std::result::Result<(), String> {
    pad_width(&args[0]).map(|_| ()).ok_or_else(|| {
        format!("invalid pad width '{}' (0 to {})", args[0], MAX_PAD_WIDTH)
    })
}

fn pad(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    let width = pad_width(&args[0]).unwrap_or(0);
    with_number(value, |n| {
        MxValue::Text(format!("{:0width$}", n.trunc() as i64, width = width))
    })
}

fn check_precision(args: &[String]) -> std::result::Result<(), String> {
    match integer_arg(args, 0)? {
        n if !(0..=20).contains(&n) => Err(format!("precision {} out of range", n)),
        _ => Ok(()),
    }
}

fn float(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    let precision = args[0].trim().parse::<usize>().unwrap_or(2);
    with_number(value, |n| MxValue::Text(format!("{:.*}", precision, n)))
}

fn percent(value: MxValue, _: &[String], locale: &MxLocale) -> Result<MxValue> {
    with_number(value, |n| {
        let body = locale.format_decimal(n * 100.0, 0);
        let sign = if locale.percent_spaced { "\u{a0}%" } else { "%" };
        MxValue::Text(format!("{}{}", body, sign))
    })
}

/// Mantissa with up to six significant decimals, then `E<exponent>`.
fn scientific(value: MxValue, _: &[String], locale: &MxLocale) -> Result<MxValue> {
    with_number(value, |n| {
        if n == 0.0 {
            return MxValue::Text("0E0".to_string());
        }
        let exponent = n.abs().log10().floor() as i32;
        let mantissa = n / 10f64.powi(exponent);
        let mut body = format!("{:.6}", mantissa);
        while body.ends_with('0') {
            body.pop();
        }
        if body.ends_with('.') {
            body.pop();
        }
        let body = body.replace('.', &locale.decimal.to_string());
        MxValue::Text(format!("{}E{}", body, exponent))
    })
}

fn humanize(value: MxValue, _: &[String], _: &MxLocale) -> Result<MxValue> {
    const LABELS: [&str; 5] = ["", "K", "M", "B", "T"];
    with_number(value, |mut n| {
        let mut idx = 0;
        while n.abs() >= 1000.0 && idx < LABELS.len() - 1 {
            n /= 1000.0;
            idx += 1;
        }
        let mut res = format!("{:.1}", n);
        if res.ends_with(".0") {
            res.truncate(res.len() - 2);
        }
        MxValue::Text(format!("{}{}", res, LABELS[idx]))
    })
}

fn ordinal(value: MxValue, _: &[String], locale: &MxLocale) -> Result<MxValue> {
    with_number(value, |n| {
        let i = n.trunc() as i64;
        let text = match locale.language {
            "en" => {
                let suffix = match (i.abs() % 10, i.abs() % 100) {
                    (_, 11..=13) => "th",
                    (1, _) => "st",
                    (2, _) => "nd",
                    (3, _) => "rd",
                    _ => "th",
                };
                format!("{}{}", i, suffix)
            }
            _ => format!("{}º", i),
        };
        MxValue::Text(text)
    })
}

fn spell_out(value: MxValue, _: &[String], locale: &MxLocale) -> Result<MxValue> {
    with_number(value, |n| {
        let words = match locale.language {
            "pt" => spell_pt(n),
            "es" => spell_es(n),
            _ => spell_en(n),
        };
        MxValue::Text(words)
    })
}

/// Digits after the decimal mark, read one by one.
fn fraction_digits(n: f64) -> Vec<u32> {
    let text = format!("{}", n.abs());
    text.split_once('.')
        .map(|(_, frac)| frac.chars().filter_map(|c| c.to_digit(10)).collect())
        .unwrap_or_default()
}

const EN_ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];
const EN_TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];
const EN_SCALES: [(u64, &str); 4] = [
    (1_000_000_000_000, "trillion"),
    (1_000_000_000, "billion"),
    (1_000_000, "million"),
    (1_000, "thousand"),
];

fn en_below_thousand(n: u64) -> String {
    let mut parts = Vec::new();
    let hundreds = n / 100;
    let rest = n % 100;
    if hundreds > 0 {
        parts.push(format!("{} hundred", EN_ONES[hundreds as usize]));
    }
    if rest > 0 {
        let words = if rest < 20 {
            EN_ONES[rest as usize].to_string()
        } else if rest % 10 == 0 {
            EN_TENS[(rest / 10) as usize].to_string()
        } else {
            format!("{}-{}", EN_TENS[(rest / 10) as usize], EN_ONES[(rest % 10) as usize])
        };
        if hundreds > 0 {
            parts.push(format!("and {}", words));
        } else {
            parts.push(words);
        }
    }
    parts.join(" ")
}

fn en_integer(mut n: u64) -> String {
    if n == 0 {
        return EN_ONES[0].to_string();
    }
    let mut parts = Vec::new();
    for (scale, name) in EN_SCALES {
        if n >= scale {
            let count = n / scale;
            let words = if count < 1_000 {
                en_below_thousand(count)
            } else {
                en_integer(count)
            };
            parts.push(format!("{} {}", words, name));
            n %= scale;
        }
    }
    if n > 0 {
        parts.push(en_below_thousand(n));
    }
    parts.join(", ")
}

fn spell_en(n: f64) -> String {
    let mut out = String::new();
    if n < 0.0 {
        out.push_str("minus ");
    }
    out.push_str(&en_integer(n.abs().trunc() as u64));
    let frac = fraction_digits(n);
    if !frac.is_empty() {
        out.push_str(" point");
        for d in frac {
            out.push(' ');
            out.push_str(EN_ONES[d as usize]);
        }
    }
    out
}

const PT_UNITS: [&str; 20] = [
    "zero", "um", "dois", "três", "quatro", "cinco", "seis", "sete", "oito", "nove", "dez",
    "onze", "doze", "treze", "catorze", "quinze", "dezesseis", "dezessete", "dezoito",
    "dezenove",
];
const PT_TENS: [&str; 10] = [
    "", "", "vinte", "trinta", "quarenta", "cinquenta", "sessenta", "setenta", "oitenta",
    "noventa",
];
const PT_HUNDREDS: [&str; 10] = [
    "", "cento", "duzentos", "trezentos", "quatrocentos", "quinhentos", "seiscentos",
    "setecentos", "oitocentos", "novecentos",
];

fn pt_below_thousand(n: u64) -> String {
    if n == 100 {
        return "cem".to_string();
    }
    let mut parts = Vec::new();
    let hundreds = n / 100;
    let rest = n % 100;
    if hundreds > 0 {
        parts.push(PT_HUNDREDS[hundreds as usize].to_string());
    }
    if rest > 0 {
        if rest < 20 {
            parts.push(PT_UNITS[rest as usize].to_string());
        } else if rest % 10 == 0 {
            parts.push(PT_TENS[(rest / 10) as usize].to_string());
        } else {
            parts.push(format!(
                "{} e {}",
                PT_TENS[(rest / 10) as usize],
                PT_UNITS[(rest % 10) as usize]
            ));
        }
    }
    parts.join(" e ")
}

fn pt_integer(mut n: u64) -> String {
    if n == 0 {
        return PT_UNITS[0].to_string();
    }
    const SCALES: [(u64, &str, &str); 4] = [
        (1_000_000_000_000, "trilhão", "trilhões"),
        (1_000_000_000, "bilhão", "bilhões"),
        (1_000_000, "milhão", "milhões"),
        (1_000, "mil", "mil"),
    ];
    let mut parts = Vec::new();
    for (scale, singular, plural) in SCALES {
        if n >= scale {
            let count = n / scale;
            let part = match (count, scale) {
                (1, 1_000) => "mil".to_string(),
                (1, _) => format!("um {}", singular),
                (2..=999, _) => format!("{} {}", pt_below_thousand(count), plural),
                _ => format!("{} {}", pt_integer(count), plural),
            };
            parts.push(part);
            n %= scale;
        }
    }
    if n > 0 {
        parts.push(pt_below_thousand(n));
    }
    match parts.len() {
        1 => parts.remove(0),
        _ => {
            let last = parts.pop().unwrap_or_default();
            if n > 0 && (n < 100 || n % 100 == 0) {
                format!("{} e {}", parts.join(", "), last)
            } else {
                format!("{}, {}", parts.join(", "), last)
            }
        }
    }
}

fn spell_pt(n: f64) -> String {
    let mut out = String::new();
    if n < 0.0 {
        out.push_str("menos ");
    }
    out.push_str(&pt_integer(n.abs().trunc() as u64));
    let frac = fraction_digits(n);
    if !frac.is_empty() {
        out.push_str(" vírgula");
        for d in frac {
            out.push(' ');
            out.push_str(PT_UNITS[d as usize]);
        }
    }
    out
}

const ES_UNITS: [&str; 30] = [
    "cero", "uno", "dos", "tres", "cuatro", "cinco", "seis", "siete", "ocho", "nueve", "diez",
    "once", "doce", "trece", "catorce", "quince", "dieciséis", "diecisiete", "dieciocho",
    "diecinueve", "veinte", "veintiuno", "veintidós", "veintitrés", "veinticuatro",
    "veinticinco", "veintiséis", "veintisiete", "veintiocho", "veintinueve",
];
const ES_TENS: [&str; 10] = [
    "", "", "", "treinta", "cuarenta", "cincuenta", "sesenta", "setenta", "ochenta", "noventa",
];
const ES_HUNDREDS: [&str; 10] = [
    "", "ciento", "doscientos", "trescientos", "cuatrocientos", "quinientos", "seiscientos",
    "setecientos", "ochocientos", "novecientos",
];

fn es_below_thousand(n: u64) -> String {
    if n == 100 {
        return "cien".to_string();
    }
    let mut parts = Vec::new();
    let hundreds = n / 100;
    let rest = n % 100;
    if hundreds > 0 {
        parts.push(ES_HUNDREDS[hundreds as usize].to_string());
    }
    if rest > 0 {
        if rest < 30 {
            parts.push(ES_UNITS[rest as usize].to_string());
        } else if rest % 10 == 0 {
            parts.push(ES_TENS[(rest / 10) as usize].to_string());
        } else {
            parts.push(format!(
                "{} y {}",
                ES_TENS[(rest / 10) as usize],
                ES_UNITS[(rest % 10) as usize]
            ));
        }
    }
    parts.join(" ")
}

fn es_integer(mut n: u64) -> String {
    if n == 0 {
        return ES_UNITS[0].to_string();
    }
    const SCALES: [(u64, &str, &str); 3] = [
        (1_000_000_000_000, "billón", "billones"),
        (1_000_000, "millón", "millones"),
        (1_000, "mil", "mil"),
    ];
    let mut parts = Vec::new();
    for (scale, singular, plural) in SCALES {
        if n >= scale {
            let count = n / scale;
            let part = match (count, scale) {
                (1, 1_000) => "mil".to_string(),
                (1, _) => format!("un {}", singular),
                _ => format!("{} {}", es_integer(count), plural),
            };
            parts.push(part);
            n %= scale;
        }
    }
    if n > 0 {
        parts.push(es_below_thousand(n));
    }
    parts.join(" ")
}

fn spell_es(n: f64) -> String {
    let mut out = String::new();
    if n < 0.0 {
        out.push_str("menos ");
    }
    out.push_str(&es_integer(n.abs().trunc() as u64));
    let frac = fraction_digits(n);
    if !frac.is_empty() {
        out.push_str(" punto");
        for d in frac {
            out.push(' ');
            out.push_str(ES_UNITS[d as usize]);
        }
    }
    out
}

/// Formats with the locale's currency conventions. The code is an ISO 4217
/// currency code; codes without a known symbol print as the code itself.
fn currency(value: MxValue, args: &[String], locale: &MxLocale) -> Result<MxValue> {
    let code = args[0].trim().to_ascii_uppercase();
    with_number(value, |n| {
        let decimals = if code == "JPY" { 0 } else { 2 };
        let amount = locale.format_decimal(n.abs(), decimals);
        let symbol = locale.currency_symbol(&code);
        let sign = if n < 0.0 && amount.chars().any(|c| c.is_ascii_digit() && c != '0') {
            "-"
        } else {
            ""
        };
        let text = match locale.currency_placement {
            MxCurrencyPlacement::Prefix => format!("{}{}{}", sign, symbol, amount),
            MxCurrencyPlacement::PrefixSpaced => format!("{}{}\u{a0}{}", sign, symbol, amount),
            MxCurrencyPlacement::SuffixSpaced => format!("{}{}\u{a0}{}", sign, amount, symbol),
        };
        MxValue::Text(text)
    })
}

/// `.,` groups with dots and uses a comma decimal mark; `,.` the reverse.
/// Other styles leave the value unchanged.
fn separator(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    let style = args[0].trim().to_string();
    let (group, decimal) = match style.as_str() {
        ".," => ('.', ','),
        ",." => (',', '.'),
        _ => return Ok(value),
    };
    with_number(value, |n| {
        let fixed = format!("{:.2}", n.abs());
        let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let sign = if n < 0.0 { "-" } else { "" };
        MxValue::Text(format!(
            "{}{}{}{}",
            sign,
            crate::locale::group_digits(int_part, group),
            decimal,
            frac
        ))
    })
}
