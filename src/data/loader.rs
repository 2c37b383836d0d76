// ============================================================
// Layer 4 - Dataset Loader
// ============================================================
// Fetches the raw churn CSV text from wherever it lives:
//
//   https://...   → HttpCsvSource  (reqwest blocking client)
//   anything else → FileCsvSource  (local path)
//
// Any failure to obtain the bytes (DNS, refused connection,
// non-2xx status, timeout, missing file, non-UTF-8 body) is a
// ChurnError::Fetch. Nothing is retried.

use std::{fs, path::PathBuf, time::Duration};

use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::traits::DatasetSource;

/// Default dataset location
pub const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/055058vandana/ANN_Project/refs/heads/main/anndataset.csv";

/// Pick the source implementation for a URL or path
pub fn open_source(reference: &str, timeout: Duration) -> Box<dyn DatasetSource> {
    let lower = reference.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Box::new(HttpCsvSource::new(reference, timeout))
    } else {
        Box::new(FileCsvSource::new(reference))
    }
}

// ─── HttpCsvSource ────────────────────────────────────────────────────────────
pub struct HttpCsvSource {
    url:     String,
    timeout: Duration,
}

impl HttpCsvSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self { url: url.into(), timeout }
    }
}

impl DatasetSource for HttpCsvSource {
    fn fetch(&self) -> ChurnResult<String> {
        tracing::info!("Downloading dataset from '{}'", self.url);

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ChurnError::fetch(&self.url, e))?;

        let response = client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ChurnError::fetch(&self.url, e))?;

        let body = response.text().map_err(|e| ChurnError::fetch(&self.url, e))?;
        tracing::debug!("Downloaded {} bytes", body.len());
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// ─── FileCsvSource ────────────────────────────────────────────────────────────
pub struct FileCsvSource {
    path: PathBuf,
}

impl FileCsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for FileCsvSource {
    fn fetch(&self) -> ChurnResult<String> {
        tracing::info!("Reading dataset from '{}'", self.path.display());
        fs::read_to_string(&self.path).map_err(|e| ChurnError::fetch(self.describe(), e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ─── InlineCsvSource ──────────────────────────────────────────────────────────
/// CSV text held in memory
#[cfg(test)]
pub struct InlineCsvSource {
    text: String,
}

#[cfg(test)]
impl InlineCsvSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[cfg(test)]
impl DatasetSource for InlineCsvSource {
    fn fetch(&self) -> ChurnResult<String> {
        Ok(self.text.clone())
    }

    fn describe(&self) -> String {
        "<inline>".to_string()
    }
}
