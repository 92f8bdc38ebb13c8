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

//! # Document Conversion
//!
//! PDF conversion goes through an external office suite, a scarce
//! process-bound resource. [`MxConversionGate`] bounds how many
//! conversions run at once and puts a deadline on each one; a conversion
//! that misses its deadline is dropped, which kills the child process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::config::MxConversionConfig;
use crate::errors::{MxError, Result};

/// Converts one document into a PDF placed in `out_dir`.
#[async_trait]
pub trait MxConverter: Send + Sync {
    async fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf>;
}

/// `soffice --headless --convert-to pdf`.
#[derive(Clone, Debug)]
pub struct MxSofficeConverter {
    binary: String,
}

impl MxSofficeConverter {
    pub fn new(binary: impl Into<String>) -> Self {
        MxSofficeConverter {
            binary: binary.into(),
        }
    }
}

impl Default for MxSofficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

#[async_trait]
impl MxConverter for MxSofficeConverter {
    async fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        let output = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| conversion_error(input, format!("cannot start '{}': {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(conversion_error(
                input,
                format!("{} ({})", output.status, stderr.trim()),
            ));
        }
        let produced = pdf_path(input, out_dir);
        if !produced.exists() {
            return Err(conversion_error(input, "converter produced no PDF"));
        }
        Ok(produced)
    }
}

/// Where the converter writes the PDF for `input`.
pub fn pdf_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    let mut name = stem;
    name.push(".pdf");
    out_dir.join(name)
}

fn conversion_error(input: &Path, message: impl Into<String>) -> MxError {
    MxError::Conversion {
        input: input.display().to_string(),
        message: message.into(),
    }
}

/// Counting permit plus per-call deadline around a converter.
#[derive(Clone, Debug)]
pub struct MxConversionGate {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl MxConversionGate {
    pub fn new(max_concurrent: usize, timeout: Duration) -> Self {
        MxConversionGate {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    pub fn from_config(config: &MxConversionConfig) -> Self {
        Self::new(config.max_concurrent, Duration::from_secs(config.timeout_secs))
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a permit, then runs the conversion under the deadline. The
    /// deadline does not include the wait.
    pub async fn convert(
        &self,
        converter: &dyn MxConverter,
        input: &Path,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MxError::internal("conversion gate closed"))?;
        log::debug!("converting {}", input.display());
        match tokio::time::timeout(self.timeout, converter.convert(input, out_dir)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "conversion of {} exceeded {}s; process terminated",
                    input.display(),
                    self.timeout.as_secs()
                );
                Err(MxError::ConversionTimeout {
                    input: input.display().to_string(),
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}
