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

//! # Locale Tables
//!
//! Static number and calendar conventions for the locales Merx formats in.
//! Lookup accepts `pt`, `pt_BR`, `pt-BR` and similar spellings; unknown
//! languages resolve to `None` so callers can fall back to their configured
//! default.

/// Where a currency symbol sits relative to the amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MxCurrencyPlacement {
    /// `$1,234.56`
    Prefix,
    /// `R$ 1.234,56`
    PrefixSpaced,
    /// `1.234,56 €`
    SuffixSpaced,
}

#[derive(Debug, PartialEq)]
pub struct MxLocale {
    pub code: &'static str,
    pub language: &'static str,
    pub decimal: char,
    pub group: char,
    pub currency_placement: MxCurrencyPlacement,
    pub percent_spaced: bool,
    pub months: [&'static str; 12],
    pub months_abbr: [&'static str; 12],
    pub weekdays: [&'static str; 7],
    /// (currency code, symbol) overrides for this locale.
    pub currency_symbols: &'static [(&'static str, &'static str)],
}

pub static PT_BR: MxLocale = MxLocale {
    code: "pt_BR",
    language: "pt",
    decimal: ',',
    group: '.',
    currency_placement: MxCurrencyPlacement::PrefixSpaced,
    percent_spaced: false,
    months: [
        "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto",
        "setembro", "outubro", "novembro", "dezembro",
    ],
    months_abbr: [
        "jan.", "fev.", "mar.", "abr.", "mai.", "jun.", "jul.", "ago.", "set.", "out.", "nov.",
        "dez.",
    ],
    weekdays: [
        "segunda-feira", "terça-feira", "quarta-feira", "quinta-feira", "sexta-feira", "sábado",
        "domingo",
    ],
    currency_symbols: &[("BRL", "R$"), ("USD", "US$"), ("EUR", "€"), ("GBP", "£"), ("JPY", "JP¥")],
};

pub static EN_US: MxLocale = MxLocale {
    code: "en_US",
    language: "en",
    decimal: '.',
    group: ',',
    currency_placement: MxCurrencyPlacement::Prefix,
    percent_spaced: false,
    months: [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ],
    months_abbr: [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ],
    weekdays: [
        "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
    ],
    currency_symbols: &[("BRL", "R$"), ("USD", "$"), ("EUR", "€"), ("GBP", "£"), ("JPY", "¥")],
};

pub static ES_ES: MxLocale = MxLocale {
    code: "es_ES",
    language: "es",
    decimal: ',',
    group: '.',
    currency_placement: MxCurrencyPlacement::SuffixSpaced,
    percent_spaced: true,
    months: [
        "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
        "octubre", "noviembre", "diciembre",
    ],
    months_abbr: [
        "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
    ],
    weekdays: [
        "lunes", "martes", "miércoles", "jueves", "viernes", "sábado", "domingo",
    ],
    currency_symbols: &[("BRL", "BRL"), ("USD", "US$"), ("EUR", "€"), ("GBP", "GBP"), ("JPY", "JPY")],
};

static LOCALES: [&MxLocale; 3] = [&PT_BR, &EN_US, &ES_ES];

impl MxLocale {
    /// Resolves a locale tag by exact code first, then by language.
    pub fn resolve(tag: &str) -> Option<&'static MxLocale> {
        let normalized = tag.trim().trim_matches(|c| c == '"' || c == '\'').replace('-', "_");
        if normalized.is_empty() {
            return None;
        }
        if let Some(found) = LOCALES
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(&normalized))
        {
            return Some(*found);
        }
        let language = normalized
            .split('_')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        LOCALES.iter().find(|l| l.language == language).copied()
    }

    /// Like [`MxLocale::resolve`] but falls back to `fallback`.
    pub fn resolve_or(tag: &str, fallback: &'static MxLocale) -> &'static MxLocale {
        Self::resolve(tag).unwrap_or(fallback)
    }

    pub fn currency_symbol<'a>(&'a self, code: &'a str) -> &'a str {
        self.currency_symbols
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(code))
            .map(|(_, s)| *s)
            .unwrap_or(code)
    }

    /// Formats `value` with a fixed number of decimals and locale grouping.
    pub fn format_decimal(&self, value: f64, decimals: usize) -> String {
        let fixed = format!("{:.*}", decimals, value.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (fixed.as_str(), None),
        };
        let mut out = String::new();
        if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
            out.push('-');
        }
        out.push_str(&group_digits(int_part, self.group));
        if let Some(frac) = frac_part {
            out.push(self.decimal);
            out.push_str(frac);
        }
        out
    }
}

/// Inserts `separator` every three digits from the right.
pub fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}
