// ============================================================
// Layer 6 - Artifact Store
// ============================================================
// Owns everything a trained model needs at prediction time and
// saves it as one numbered version.
//
// Files per version N:
//   churn_model_vN.mpk   - burn record of the model weights
//   scaler_vN.json       - fitted StandardScaler
//   encodings_vN.json    - fitted EncodingTable
//
// Shared files:
//   manifest.json        - points at the current version and records
//                          the architecture config needed to rebuild
//                          the model before loading its weights
//   .lock                - exists only while a save is in progress;
//                          holds the saver's pid so a lock left by a
//                          killed process can be recognised as stale
//
// A save runs in this order:
//   1. create .lock with create-new semantics (fails if held)
//   2. compare the current manifest version with the version the
//      caller started from (fails with a conflict if it moved)
//   3. write the versioned files
//   4. write manifest.json to a temp file and rename it into place
//   5. prune versions older than the previous one
//
// Readers only ever follow manifest.json, so until step 4 lands
// they keep seeing the previous version.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessesToUpdate, System};
use tempfile::NamedTempFile;

use crate::data::{encoder::EncodingTable, scaler::StandardScaler};
use crate::domain::customer::{schema_fingerprint, FEATURE_COLUMNS, FEATURE_WIDTH};
use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::hyperparams::HyperparameterConfig;
use crate::ml::model::{ChurnModel, ChurnModelConfig};
use crate::ml::trainer::InferBackend;

const MANIFEST_FILE: &str = "manifest.json";
const LOCK_FILE: &str     = ".lock";

type ModelRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

// ─── Manifest ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version:            u64,
    pub feature_columns:    Vec<String>,
    pub schema_fingerprint: String,
    pub model_config:       ChurnModelConfig,
    pub model_file:         String,
    pub scaler_file:        String,
    pub encodings_file:     String,
    pub trained_at:         DateTime<Utc>,
    pub hyperparameters:    HyperparameterConfig,
    pub learning_rate:      f64,
    pub train_rows:         usize,
    pub val_rows:           usize,
}

impl ArtifactManifest {
    /// The manifest must describe exactly the schema this binary scores with
    fn check_schema(&self) -> ChurnResult<()> {
        if self.feature_columns.len() != FEATURE_WIDTH {
            return Err(ChurnError::DataShape {
                expected: FEATURE_WIDTH,
                actual:   self.feature_columns.len(),
            });
        }
        let same_columns = self
            .feature_columns
            .iter()
            .zip(FEATURE_COLUMNS.iter())
            .all(|(a, b)| a == b);
        if !same_columns || self.schema_fingerprint != schema_fingerprint() {
            return Err(ChurnError::validation(
                "schema_fingerprint",
                format!(
                    "artifacts were trained on schema {} but this build uses {}",
                    self.schema_fingerprint,
                    schema_fingerprint(),
                ),
            ));
        }
        Ok(())
    }
}

/// What a retraining run hands over to be persisted
pub struct ArtifactBundle<'a> {
    pub model:           &'a ChurnModel<InferBackend>,
    pub model_config:    &'a ChurnModelConfig,
    pub scaler:          &'a StandardScaler,
    pub encodings:       &'a EncodingTable,
    pub hyperparameters: &'a HyperparameterConfig,
    pub learning_rate:   f64,
    pub train_rows:      usize,
    pub val_rows:        usize,
}

pub struct LoadedArtifacts {
    pub manifest:  ArtifactManifest,
    pub model:     ChurnModel<InferBackend>,
    pub scaler:    StandardScaler,
    pub encodings: EncodingTable,
}

// ─── Lock ────────────────────────────────────────────────────────────────────

/// Held for the duration of one save; removes the lock file on drop.
struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    fn acquire(dir: &Path) -> ChurnResult<Self> {
        let path = dir.join(LOCK_FILE);
        match Self::create(&path) {
            Err(e) if e.kind() == ErrorKind::AlreadyExists && Self::holder_is_gone(&path) => {
                tracing::warn!("Removing stale lock '{}' left by a process that no longer runs", path.display());
                fs::remove_file(&path).map_err(|e| ChurnError::persistence("lock", e))?;
                Self::create(&path).map_err(|e| Self::held(&path, e))
            }
            other => other.map_err(|e| Self::held(&path, e)),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut f = OpenOptions::new().write(true).create_new(true).open(path)?;
        if let Err(e) = writeln!(f, "{}", std::process::id()) {
            let _ = fs::remove_file(path);
            return Err(e);
        }
        Ok(Self { path: path.to_path_buf() })
    }

    /// True only when the lock names a pid that is no longer running.
    /// An empty or unreadable lock may belong to a saver that has not
    /// written its pid yet, so it counts as held.
    fn holder_is_gone(path: &Path) -> bool {
        let Some(pid) = fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
        else {
            return false;
        };
        let pid = Pid::from_u32(pid);
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.process(pid).is_none()
    }

    fn held(path: &Path, e: std::io::Error) -> ChurnError {
        if e.kind() == ErrorKind::AlreadyExists {
            ChurnError::persistence(
                "lock",
                format!(
                    "'{}' exists; another process is saving. Remove it if no save is running.",
                    path.display()
                ),
            )
        } else {
            ChurnError::persistence("lock", e)
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Could not remove lock file '{}': {}", self.path.display(), e);
        }
    }
}

// ─── Store ───────────────────────────────────────────────────────────────────

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// None when nothing has been saved yet
    pub fn current_version(&self) -> ChurnResult<Option<u64>> {
        Ok(self.read_manifest()?.map(|m| m.version))
    }

    pub fn load_manifest(&self) -> ChurnResult<ArtifactManifest> {
        self.read_manifest()?.ok_or_else(|| {
            ChurnError::persistence(
                "load",
                format!(
                    "no trained model in '{}'. Run 'retrain' first.",
                    self.dir.display()
                ),
            )
        })
    }

    /// Load the model, scaler and encodings of the current version.
    pub fn load(&self) -> ChurnResult<LoadedArtifacts> {
        let manifest = self.load_manifest()?;
        manifest.check_schema()?;

        tracing::info!("Loading artifacts version {} from '{}'", manifest.version, self.dir.display());

        let scaler: StandardScaler   = self.read_json(&manifest.scaler_file)?;
        let encodings: EncodingTable = self.read_json(&manifest.encodings_file)?;
        if scaler.width() != FEATURE_WIDTH {
            return Err(ChurnError::DataShape { expected: FEATURE_WIDTH, actual: scaler.width() });
        }

        let model = self.load_model::<InferBackend>(&manifest, &Default::default())?;

        Ok(LoadedArtifacts { manifest, model, scaler, encodings })
    }

    /// The current manifest and its model on backend `B`, after the same
    /// schema check `load` applies. Retraining continues from this.
    pub fn load_current_model<B: Backend>(
        &self,
        device: &B::Device,
    ) -> ChurnResult<(ArtifactManifest, ChurnModel<B>)> {
        let manifest = self.load_manifest()?;
        manifest.check_schema()?;
        let model = self.load_model::<B>(&manifest, device)?;
        Ok((manifest, model))
    }

    /// Rebuild the manifest's architecture on backend `B` and load the
    /// saved weights into it. Records are backend-agnostic, so retraining
    /// loads straight onto the autodiff backend.
    fn load_model<B: Backend>(
        &self,
        manifest: &ArtifactManifest,
        device:   &B::Device,
    ) -> ChurnResult<ChurnModel<B>> {
        let path   = self.dir.join(&manifest.model_file);
        let record = <ModelRecorder as Recorder<B>>::load(&ModelRecorder::new(), path.clone(), device)
            .map_err(|e| ChurnError::persistence("load", format!("'{}': {e:?}", path.display())))?;
        // Initial weights are overwritten by the record
        Ok(manifest.model_config.init::<B>(0, device).load_record(record))
    }

    /// Persist a new version. `expected_version` is the version the caller
    /// read before it started training; the save fails if it moved since.
    pub fn save(
        &self,
        expected_version: Option<u64>,
        bundle:           ArtifactBundle<'_>,
    ) -> ChurnResult<ArtifactManifest> {
        fs::create_dir_all(&self.dir).map_err(|e| ChurnError::persistence("save", e))?;
        let _lock = StoreLock::acquire(&self.dir)?;

        let current = self.current_version()?;
        if current != expected_version {
            return Err(ChurnError::persistence(
                "save",
                format!(
                    "version conflict: run started from {} but the store is now at {}",
                    describe_version(expected_version),
                    describe_version(current),
                ),
            ));
        }

        let version  = current.map_or(1, |v| v + 1);
        let manifest = ArtifactManifest {
            version,
            feature_columns:    FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            schema_fingerprint: schema_fingerprint(),
            model_config:       bundle.model_config.clone(),
            model_file:         format!("churn_model_v{version}.mpk"),
            scaler_file:        format!("scaler_v{version}.json"),
            encodings_file:     format!("encodings_v{version}.json"),
            trained_at:         Utc::now(),
            hyperparameters:    bundle.hyperparameters.clone(),
            learning_rate:      bundle.learning_rate,
            train_rows:         bundle.train_rows,
            val_rows:           bundle.val_rows,
        };

        if let Err(e) = self.write_version_files(&manifest, &bundle) {
            self.remove_version_files(version);
            return Err(e);
        }
        if let Err(e) = self.write_json_atomic(MANIFEST_FILE, &manifest) {
            self.remove_version_files(version);
            return Err(e);
        }

        tracing::info!("Saved artifacts version {} to '{}'", version, self.dir.display());
        self.prune(version);
        Ok(manifest)
    }

    fn write_version_files(
        &self,
        manifest: &ArtifactManifest,
        bundle:   &ArtifactBundle<'_>,
    ) -> ChurnResult<()> {
        self.write_json_atomic(&manifest.scaler_file, bundle.scaler)?;
        self.write_json_atomic(&manifest.encodings_file, bundle.encodings)?;

        // The recorder appends its own ".mpk" extension
        let stem = self.dir.join(format!("churn_model_v{}", manifest.version));
        ModelRecorder::new()
            .record(bundle.model.clone().into_record(), stem.clone())
            .map_err(|e| ChurnError::persistence("save", format!("'{}': {e:?}", stem.display())))?;
        Ok(())
    }

    fn read_manifest(&self) -> ChurnResult<Option<ArtifactManifest>> {
        let path = self.dir.join(MANIFEST_FILE);
        match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| ChurnError::persistence("load", format!("'{}': {e}", path.display()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ChurnError::persistence("load", format!("'{}': {e}", path.display()))),
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, file: &str) -> ChurnResult<T> {
        let path = self.dir.join(file);
        let json = fs::read_to_string(&path)
            .map_err(|e| ChurnError::persistence("load", format!("'{}': {e}", path.display())))?;
        serde_json::from_str(&json)
            .map_err(|e| ChurnError::persistence("load", format!("'{}': {e}", path.display())))
    }

    /// Write to a temp file in the same directory, then rename over `file`.
    fn write_json_atomic<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> ChurnResult<()> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| ChurnError::persistence("save", e))?;

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| ChurnError::persistence("save", e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| ChurnError::persistence("save", e))?;
        tmp.persist(&path)
            .map_err(|e| ChurnError::persistence("save", format!("'{}': {}", path.display(), e.error)))?;

        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn remove_version_files(&self, version: u64) {
        for name in version_file_names(version) {
            let _ = fs::remove_file(self.dir.join(name));
        }
    }

    /// Keep the new version and the one before it
    fn prune(&self, newest: u64) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Skipping prune of '{}': {}", self.dir.display(), e);
                return;
            }
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(v) = parse_version(&name) {
                if v + 1 < newest {
                    match fs::remove_file(entry.path()) {
                        Ok(()) => tracing::debug!("Pruned '{}'", name),
                        Err(e) => tracing::warn!("Could not prune '{}': {}", name, e),
                    }
                }
            }
        }
    }
}

fn describe_version(v: Option<u64>) -> String {
    v.map_or_else(|| "an empty store".to_string(), |v| format!("version {v}"))
}

fn version_file_names(version: u64) -> [String; 3] {
    [
        format!("churn_model_v{version}.mpk"),
        format!("scaler_v{version}.json"),
        format!("encodings_v{version}.json"),
    ]
}

/// "scaler_v3.json" → Some(3)
fn parse_version(file_name: &str) -> Option<u64> {
    let rest = ["churn_model_v", "scaler_v", "encodings_v"]
        .iter()
        .find_map(|prefix| file_name.strip_prefix(prefix))?;
    let (number, ext) = rest.split_once('.')?;
    if ext != "mpk" && ext != "json" {
        return None;
    }
    number.parse().ok()
}
