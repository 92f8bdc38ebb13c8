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

//! Run reunification.
//!
//! Authoring tools split text into runs wherever formatting, spell-check or
//! revision marks change, so `{{ name }}` can arrive as `{{ na` + `me }}`.
//! [`reunify`] moves every placeholder that crosses a run boundary into the
//! run holding its opening `{{`: runs strictly inside the placeholder become
//! empty and the run holding the closing `}}` keeps only the text after it.
//! Text outside placeholders stays in its original run, so its formatting is
//! preserved.
//!
//! The concatenated text never changes, and afterwards no placeholder
//! crosses a boundary, so applying the transform again is a no-op.

use crate::dsl::parser::{scan_placeholders, MxPlaceholder};

/// Redistributes `runs` so that every complete placeholder sits in one run.
/// The output has the same length as the input.
pub fn reunify<S: AsRef<str>>(runs: &[S]) -> Vec<String> {
    let joined: String = runs.iter().map(AsRef::as_ref).collect();
    let mut bounds = Vec::with_capacity(runs.len() + 1);
    let mut offset = 0;
    for run in runs {
        bounds.push(offset);
        offset += run.as_ref().len();
    }
    bounds.push(offset);

    for placeholder in scan_placeholders(&joined) {
        for bound in bounds.iter_mut() {
            if *bound > placeholder.start && *bound < placeholder.end {
                *bound = placeholder.end;
            }
        }
    }

    bounds
        .windows(2)
        .map(|w| joined[w[0]..w[1]].to_string())
        .collect()
}

/// True when some placeholder in the concatenated runs crosses a boundary.
pub fn is_fragmented<S: AsRef<str>>(runs: &[S]) -> bool {
    let joined: String = runs.iter().map(AsRef::as_ref).collect();
    let mut bounds = Vec::new();
    let mut offset = 0;
    for run in runs.iter().take(runs.len().saturating_sub(1)) {
        offset += run.as_ref().len();
        bounds.push(offset);
    }
    scan_placeholders(&joined)
        .iter()
        .any(|p| bounds.iter().any(|b| *b > p.start && *b < p.end))
}

/// Placeholders of every run after reunification, tagged with the run index.
pub fn placeholders_by_run<S: AsRef<str>>(runs: &[S]) -> Vec<(usize, MxPlaceholder)> {
    reunify(runs)
        .iter()
        .enumerate()
        .flat_map(|(idx, text)| scan_placeholders(text).into_iter().map(move |p| (idx, p)))
        .collect()
}
