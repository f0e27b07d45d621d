//! Run directory bookkeeping

use super::{Pipeline, Stage};
use crate::config::TypingConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// SHA-256 of the resolved document, hex encoded
#[must_use]
pub fn config_digest(yaml: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(yaml.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// What was set up, when, and from which document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub created_at: DateTime<Utc>,
    pub config_sha256: String,
    pub task: String,
    pub stages: Vec<Stage>,
    pub version: String,
}

/// A prepared `work_dir`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDir {
    root: PathBuf,
}

impl RunDir {
    pub const CONFIG_FILE: &'static str = "config.yaml";
    pub const RECORD_FILE: &'static str = "run.json";

    /// Create `work_dir` (and its parents) if missing
    pub fn prepare(work_dir: impl AsRef<Path>) -> Result<Self> {
        let root = work_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| Error::io(&root, e))?;
        tracing::debug!(path = %root.display(), "run directory ready");
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(Self::CONFIG_FILE)
    }

    pub fn record_path(&self) -> PathBuf {
        self.root.join(Self::RECORD_FILE)
    }

    /// Whether an earlier run already left a record here
    pub fn is_recorded(&self) -> bool {
        self.config_path().exists() || self.record_path().exists()
    }

    /// Write the resolved document and a run record
    ///
    /// The stored document spells out every default, so re-loading it
    /// reproduces the same configuration. Files from an earlier run in the
    /// same directory are replaced, with a warning.
    pub fn record(&self, config: &TypingConfig, pipeline: &Pipeline) -> Result<RunRecord> {
        if self.is_recorded() {
            tracing::warn!(
                path = %self.root.display(),
                "replacing the record of an earlier run"
            );
        }

        let yaml = config
            .to_yaml_string()
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let config_path = self.config_path();
        fs::write(&config_path, &yaml).map_err(|e| Error::io(&config_path, e))?;

        let record = RunRecord {
            created_at: Utc::now(),
            config_sha256: config_digest(&yaml),
            task: pipeline.task.as_str().to_string(),
            stages: pipeline.stages.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let record_path = self.record_path();
        fs::write(&record_path, json).map_err(|e| Error::io(&record_path, e))?;

        tracing::info!(path = %self.root.display(), digest = %record.config_sha256, "run recorded");
        Ok(record)
    }

    pub fn read_record(&self) -> Result<RunRecord> {
        let path = self.record_path();
        let json = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::from_str(&json).map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config, parse_config};
    use crate::pipeline::build_pipeline;
    use crate::registry::ComponentRegistry;
    use tempfile::TempDir;

    const EXAMPLE: &str = include_str!("../../configs/entity_typing.yaml");

    #[test]
    fn test_config_digest() {
        assert_eq!(
            config_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(config_digest("a: 1\n"), config_digest("a: 2\n"));
    }

    #[test]
    fn test_prepare_creates_nested_dir() {
        let dir = TempDir::new().unwrap();
        let work_dir = dir.path().join("experiments").join("toy_wiki");
        let run_dir = RunDir::prepare(&work_dir).unwrap();
        assert!(work_dir.is_dir());
        assert_eq!(run_dir.path(), work_dir.as_path());

        // Idempotent
        assert!(RunDir::prepare(&work_dir).is_ok());
    }

    #[test]
    fn test_record_writes_reloadable_config() {
        let dir = TempDir::new().unwrap();
        let registry = ComponentRegistry::builtin();
        let config = parse_config(EXAMPLE, &registry).unwrap();
        let pipeline = build_pipeline(&config, &registry).unwrap();

        let run_dir = RunDir::prepare(dir.path().join("run")).unwrap();
        let record = run_dir.record(&config, &pipeline).unwrap();

        assert_eq!(record.task, "entity-typing");
        assert_eq!(record.stages, pipeline.stages);
        assert_eq!(record.config_sha256.len(), 64);

        let reloaded = load_config(run_dir.config_path()).unwrap();
        assert_eq!(reloaded, config);

        let stored = run_dir.read_record().unwrap();
        assert_eq!(stored, record);
    }

    #[test]
    fn test_record_replaces_earlier_run() {
        let dir = TempDir::new().unwrap();
        let registry = ComponentRegistry::builtin();
        let first = parse_config(EXAMPLE, &registry).unwrap();
        let run_dir = RunDir::prepare(dir.path().join("run")).unwrap();
        assert!(!run_dir.is_recorded());

        run_dir
            .record(&first, &build_pipeline(&first, &registry).unwrap())
            .unwrap();
        assert!(run_dir.is_recorded());

        let mut second = first.clone();
        second.train.max_epochs = 5;
        let record = run_dir
            .record(&second, &build_pipeline(&second, &registry).unwrap())
            .unwrap();

        assert_eq!(load_config(run_dir.config_path()).unwrap(), second);
        assert_eq!(run_dir.read_record().unwrap().config_sha256, record.config_sha256);
    }

    #[test]
    fn test_read_missing_record() {
        let dir = TempDir::new().unwrap();
        let run_dir = RunDir::prepare(dir.path()).unwrap();
        assert!(matches!(run_dir.read_record(), Err(Error::Io { .. })));
    }
}
