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

//! # Merx Configuration Module
//!
//! Runtime settings for rendering, conversion and job housekeeping.
//! Values come from defaults, then an optional JSON/YAML file, then
//! environment overrides.
//!
//! ```yaml
//! locale: en_US
//! default_currency: USD
//! work_dir: /var/lib/merx
//! conversion:
//!   binary: soffice
//!   timeout_secs: 90
//!   max_concurrent: 1
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{MxError, Result};
use crate::locale::{MxLocale, PT_BR};

/// Settings of the external document converter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MxConversionConfig {
    pub binary: String,
    pub timeout_secs: u64,
    /// Conversions allowed to run at the same time.
    pub max_concurrent: usize,
}

impl Default for MxConversionConfig {
    fn default() -> Self {
        MxConversionConfig {
            binary: "soffice".to_string(),
            timeout_secs: 120,
            max_concurrent: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MxConfig {
    pub locale: String,
    pub default_currency: String,
    /// Scratch space for sessions, jobs and result archives.
    pub work_dir: PathBuf,
    /// Persistent templates referenced by asynchronous requests.
    pub templates_dir: PathBuf,
    pub render_workers: usize,
    /// Malformed directives fail the render instead of passing the raw value.
    pub strict_directives: bool,
    pub conversion: MxConversionConfig,
    pub job_ttl_secs: u64,
    pub cleanup_interval_secs: u64,
    pub log_level: String,
}

impl Default for MxConfig {
    fn default() -> Self {
        MxConfig {
            locale: "pt_BR".to_string(),
            default_currency: "BRL".to_string(),
            work_dir: PathBuf::from("/data/temp"),
            templates_dir: PathBuf::from("/data/templates"),
            render_workers: num_cpus::get().max(1),
            strict_directives: false,
            conversion: MxConversionConfig::default(),
            job_ttl_secs: 3600,
            cleanup_interval_secs: 600,
            log_level: "info".to_string(),
        }
    }
}

impl MxConfig {
    /// Loads a `.json`, `.yaml` or `.yml` file over the defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let config: MxConfig = match extension.as_str() {
            "json" => serde_json::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            other => {
                return Err(MxError::validation(format!(
                    "unsupported config format '{}'",
                    other
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Applies `MERX_WORK_DIR` (or the older `TEMP_DIR`),
    /// `MERX_TEMPLATES_DIR`, `MERX_LOCALE` and `MERX_LOG_LEVEL`.
    pub fn apply_env(mut self) -> Self {
        if let Some(dir) = env_var("MERX_WORK_DIR").or_else(|| env_var("TEMP_DIR")) {
            self.work_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env_var("MERX_TEMPLATES_DIR") {
            self.templates_dir = PathBuf::from(dir);
        }
        if let Some(locale) = env_var("MERX_LOCALE") {
            self.locale = locale;
        }
        if let Some(level) = env_var("MERX_LOG_LEVEL") {
            self.log_level = level;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.render_workers == 0 {
            return Err(MxError::validation("render_workers must be at least 1"));
        }
        if self.conversion.max_concurrent == 0 {
            return Err(MxError::validation("conversion.max_concurrent must be at least 1"));
        }
        if self.conversion.timeout_secs == 0 {
            return Err(MxError::validation("conversion.timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Configured locale, falling back to `pt_BR` when unknown.
    pub fn resolved_locale(&self) -> &'static MxLocale {
        MxLocale::resolve_or(&self.locale, &PT_BR)
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.work_dir.join("jobs")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.work_dir.join("sessions")
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Partial configuration; unset fields keep their defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MxConfigBuilder {
    pub locale: Option<String>,
    pub default_currency: Option<String>,
    pub work_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub render_workers: Option<usize>,
    pub strict_directives: Option<bool>,
    pub conversion: Option<MxConversionConfig>,
    pub job_ttl_secs: Option<u64>,
    pub cleanup_interval_secs: Option<u64>,
    pub log_level: Option<String>,
}

impl MxConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn default_currency(mut self, code: impl Into<String>) -> Self {
        self.default_currency = Some(code.into());
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(dir.into());
        self
    }

    pub fn render_workers(mut self, workers: usize) -> Self {
        self.render_workers = Some(workers);
        self
    }

    pub fn strict_directives(mut self, strict: bool) -> Self {
        self.strict_directives = Some(strict);
        self
    }

    pub fn conversion(mut self, conversion: MxConversionConfig) -> Self {
        self.conversion = Some(conversion);
        self
    }

    pub fn build(self) -> Result<MxConfig> {
        let base = MxConfig::default();
        let config = MxConfig {
            locale: self.locale.unwrap_or(base.locale),
            default_currency: self.default_currency.unwrap_or(base.default_currency),
            work_dir: self.work_dir.unwrap_or(base.work_dir),
            templates_dir: self.templates_dir.unwrap_or(base.templates_dir),
            render_workers: self.render_workers.unwrap_or(base.render_workers),
            strict_directives: self.strict_directives.unwrap_or(base.strict_directives),
            conversion: self.conversion.unwrap_or(base.conversion),
            job_ttl_secs: self.job_ttl_secs.unwrap_or(base.job_ttl_secs),
            cleanup_interval_secs: self
                .cleanup_interval_secs
                .unwrap_or(base.cleanup_interval_secs),
            log_level: self.log_level.unwrap_or(base.log_level),
        };
        config.validate()?;
        Ok(config)
    }
}
