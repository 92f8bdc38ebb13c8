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

//! Image directives. The value names an asset; the single `size` step
//! records the requested display size for the merge engine.

use crate::errors::Result;
use crate::locale::MxLocale;
use crate::operator::{MxImageSpec, MxOperation, MxValue};

pub static OPERATIONS: &[MxOperation] = &[MxOperation::checked("size", 2, size, check_size)];

/// `auto` or a blank dimension means "derive from the image".
pub fn parse_dimension(raw: &str) -> std::result::Result<Option<f64>, String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    let cm = raw
        .trim_end_matches("cm")
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| format!("invalid image dimension '{}'", raw))?;
    if !(cm > 0.0 && cm.is_finite()) {
        return Err(format!("image dimension must be positive, found '{}'", raw));
    }
    Ok(Some(cm))
}

fn check_size(args: &[String]) -> std::result::Result<(), String> {
    parse_dimension(&args[0])?;
    parse_dimension(&args[1])?;
    Ok(())
}

fn size(value: MxValue, args: &[String], _: &MxLocale) -> Result<MxValue> {
    let filename = match value {
        MxValue::Image(spec) => spec.filename,
        other => other.to_text().trim().to_string(),
    };
    Ok(MxValue::Image(MxImageSpec {
        filename,
        width_cm: parse_dimension(&args[0]).ok().flatten(),
        height_cm: parse_dimension(&args[1]).ok().flatten(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions() {
        assert_eq!(parse_dimension("auto"), Ok(None));
        assert_eq!(parse_dimension("4,5"), Ok(Some(4.5)));
        assert_eq!(parse_dimension("3cm"), Ok(Some(3.0)));
        assert!(parse_dimension("-1").is_err());
        assert!(parse_dimension("wide").is_err());
    }
}
