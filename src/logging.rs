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

//! Logger initialisation over the `log` facade.
//!
//! The library only emits records; binaries call [`init`] once. Later calls
//! are ignored so tests and embedders can call it freely.

use std::sync::OnceLock;

use log::LevelFilter;

use crate::config::MxConfig;

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Maps a configured level name to a filter. Unknown names read as `info`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_uppercase().as_str() {
        "OFF" => LevelFilter::Off,
        "ERROR" => LevelFilter::Error,
        "WARN" | "WARNING" => LevelFilter::Warn,
        "DEBUG" => LevelFilter::Debug,
        "TRACE" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Installs `env_logger` at the configured level. `RUST_LOG`, when set,
/// takes precedence.
pub fn init(config: &MxConfig) {
    INITIALISED.get_or_init(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(parse_level(&config.log_level));
        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }
        builder.format_timestamp_millis();
        if let Err(err) = builder.try_init() {
            eprintln!("merx: logger already installed: {}", err);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(parse_level("warning"), LevelFilter::Warn);
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }

    #[test]
    fn init_is_idempotent() {
        let config = MxConfig::default();
        init(&config);
        init(&config);
    }
}
