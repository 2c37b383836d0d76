// ============================================================
// Layer 2 - ExportUseCase
// ============================================================
// Writes the standalone inference script for the current
// artifact version.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::infra::{
    artifact_store::ArtifactStore,
    exporter::{render_inference_script, write_script},
};

pub struct ExportUseCase<'a> {
    store: &'a ArtifactStore,
}

impl<'a> ExportUseCase<'a> {
    pub fn new(store: &'a ArtifactStore) -> Self {
        Self { store }
    }

    /// `binary` is the command the script will call, usually the
    /// absolute path of the running executable.
    pub fn execute(&self, output: &Path, binary: &str) -> Result<PathBuf> {
        // Refuse to export a script that could only fail
        let manifest = self
            .store
            .load_manifest()
            .context("Nothing to export")?;

        let artifacts_dir = absolute(self.store.dir());
        let script = render_inference_script(
            binary,
            &artifacts_dir.to_string_lossy(),
            &manifest.schema_fingerprint,
        );
        write_script(output, &script)?;

        tracing::info!(
            "Exported inference script for artifacts version {} to '{}'",
            manifest.version,
            output.display(),
        );
        Ok(output.to_path_buf())
    }
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
