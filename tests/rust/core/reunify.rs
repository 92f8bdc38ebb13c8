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

//! # Merx Reunification Tests
//!
//! Run reunification properties and variable extraction from fragmented
//! templates.

#[path = "../common/mod.rs"]
mod common;

use merx::document::runs::{is_fragmented, reunify};
use merx::validator::{extract, extract_detailed, validate};
use merx::MxTemplateStatus;
use proptest::prelude::*;

use common::docx_template;

const ATOMS: &[&str] = &["{{ name }}", "{{ total | format_currency() }}", "Dear ", ", ", "{", "}", "x", " "];

fn split_at(text: &str, mut cuts: Vec<usize>) -> Vec<String> {
    cuts.iter_mut().for_each(|c| *c %= text.len() + 1);
    cuts.sort_unstable();
    let mut runs = Vec::new();
    let mut last = 0;
    for cut in cuts {
        runs.push(text[last..cut].to_string());
        last = cut;
    }
    runs.push(text[last..].to_string());
    runs
}

proptest! {
    /// Reunification keeps the text, removes fragmentation and is idempotent.
    #[test]
    fn test_reunify_properties(
        picks in prop::collection::vec(0..ATOMS.len(), 0..12),
        cuts in prop::collection::vec(0usize..200, 0..8),
    ) {
        let text: String = picks.iter().map(|i| ATOMS[*i]).collect();
        let runs = split_at(&text, cuts);
        let once = reunify(&runs);
        prop_assert_eq!(once.len(), runs.len());
        prop_assert_eq!(once.concat(), text);
        prop_assert!(!is_fragmented(&once));
        prop_assert_eq!(reunify(&once), once);
    }
}

/// Variables split across runs are still found.
#[test]
fn test_extract_from_fragmented_runs() {
    let template = docx_template(
        "letter.docx",
        &[
            &["Hello {{ na", "me }}, {{ name | format_string(upper) }}"],
            &["Phone: {{ ph", "one | format_mask('(##) #####-####') }}"],
        ],
    );
    let vars = extract(&template).unwrap();
    let names: Vec<(&str, usize)> = vars.iter().map(|v| (v.name.as_str(), v.occurrences)).collect();
    assert_eq!(names, vec![("name", 2), ("phone", 1)]);
}

#[test]
fn test_invalid_directives_are_reported() {
    let template = docx_template("bad.docx", &[&["{{ x | format_string(nope) }} {{ bad name }}"]]);
    let extraction = extract_detailed(&template).unwrap();
    assert_eq!(extraction.invalid_directives.len(), 2);
    assert_eq!(extraction.variables.len(), 1);
}

#[test]
fn test_validate_lists_missing_columns() {
    let templates = vec![
        docx_template("a.docx", &[&["{{ name }} {{ phone }}"]]),
        docx_template("b.docx", &[&["{{ name }}"]]),
    ];
    let report = validate(&templates, &["name", "email"]).unwrap();
    assert!(!report.overall_valid);
    assert_eq!(report.details[0].status, MxTemplateStatus::Issues);
    assert_eq!(report.details[0].missing_vars, vec!["phone".to_string()]);
    assert_eq!(report.details[1].status, MxTemplateStatus::Ok);
    assert_eq!(report.details[1].matched_vars, vec!["name".to_string()]);
}
