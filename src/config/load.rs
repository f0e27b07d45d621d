//! Loading a training document from text or disk

use super::overrides::Overrides;
use super::schema::TypingConfig;
use super::validate::validate_config;
use crate::dataset::resolve_sources;
use crate::error::{Error, Result};
use crate::registry::ComponentRegistry;
use std::fs;
use std::path::Path;

/// Parse and check a document held in memory
///
/// Runs the three load phases in order and stops at the first failure:
/// 1. Schema (structure, unknown keys, defaults, data source syntax)
/// 2. Type resolution against `registry`
/// 3. Numeric ranges
pub fn parse_config(text: &str, registry: &ComponentRegistry) -> Result<TypingConfig> {
    parse_config_with(text, &Overrides::default(), registry)
}

/// Same as [`parse_config`], with `overrides` applied after the schema phase
pub fn parse_config_with(
    text: &str,
    overrides: &Overrides,
    registry: &ComponentRegistry,
) -> Result<TypingConfig> {
    let mut config = TypingConfig::from_yaml_str(text)?;
    resolve_sources(&config.dataset.data_file)?;

    if !overrides.is_empty() {
        tracing::debug!(?overrides, "applying overrides");
        overrides.apply(&mut config);
    }

    registry.check(&config)?;
    validate_config(&config)?;

    tracing::debug!(task = %config.task, model = %config.model.kind, "config accepted");
    Ok(config)
}

/// Load a document from `config_path` using the built-in registry
///
/// ```no_run
/// use typing_config::config::load_config;
///
/// let config = load_config("configs/entity_typing.yaml")?;
/// assert_eq!(config.evaluation.metrics, "typing-metric");
/// # Ok::<(), typing_config::Error>(())
/// ```
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<TypingConfig> {
    load_config_with(config_path, &Overrides::default(), &ComponentRegistry::builtin())
}

/// Load a document from `config_path` with overrides and a custom registry
pub fn load_config_with<P: AsRef<Path>>(
    config_path: P,
    overrides: &Overrides,
    registry: &ComponentRegistry,
) -> Result<TypingConfig> {
    let path = config_path.as_ref();
    tracing::info!(path = %path.display(), "loading config");

    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_config_with(&text, overrides, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaError;
    use crate::dataset::FetchError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EXAMPLE: &str = include_str!("../../configs/entity_typing.yaml");

    fn write_temp(text: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(text.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_temp(EXAMPLE);
        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.task, "entity-typing");
        assert_eq!(config.train.dataloader.batch_size_per_gpu, 16);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/nonexistent/typing.yaml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/typing.yaml"));
    }

    #[test]
    fn test_load_malformed_yaml() {
        let temp_file = write_temp("this is not valid yaml: [}");
        let err = load_config(temp_file.path()).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_schema_checked_before_types() {
        let yaml = EXAMPLE
            .replace("type: linear", "type: crf")
            .replace("max_epochs: 1", "max_epochs: one");
        let err = parse_config(&yaml, &ComponentRegistry::builtin()).unwrap_err();
        assert!(matches!(err, Error::Schema(_)), "got {err:?}");
    }

    #[test]
    fn test_types_checked_before_ranges() {
        let yaml = EXAMPLE
            .replace("type: linear", "type: crf")
            .replace("lr: 5.0e-5", "lr: -1");
        let err = parse_config(&yaml, &ComponentRegistry::builtin()).unwrap_err();
        assert!(matches!(err, Error::TypeResolution(_)), "got {err:?}");
    }

    #[test]
    fn test_unsupported_data_scheme_rejected_at_load() {
        let yaml = EXAMPLE.replace(
            "'https://www.modelscope.cn/api/v1/datasets/izhx404/toy_msra/repo/files?Revision=master&FilePath=toy_wiki.zip'",
            "'s3://bucket/toy_wiki.zip'",
        );
        let err = parse_config(&yaml, &ComponentRegistry::builtin()).unwrap_err();
        assert!(
            matches!(err, Error::ResourceFetch(FetchError::UnsupportedScheme { .. })),
            "got {err:?}"
        );
    }

    #[test]
    fn test_label_file_without_file_rejected_at_load() {
        let yaml = EXAMPLE.replace("type: count_span_labels", "type: label_file");
        let err = parse_config(&yaml, &ComponentRegistry::builtin()).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::MissingField("dataset.labels.file"))
        ));
    }

    #[test]
    fn test_overrides_are_validated() {
        let overrides = Overrides {
            lr: Some(-0.5),
            ..Overrides::default()
        };
        let err = parse_config_with(EXAMPLE, &overrides, &ComponentRegistry::builtin()).unwrap_err();
        match err {
            Error::ValueRange(e) => assert_eq!(e.field, "train.optimizer.lr"),
            other => panic!("Expected ValueRange, got {other:?}"),
        }
    }

    #[test]
    fn test_load_with_overrides() {
        let temp_file = write_temp(EXAMPLE);
        let overrides = Overrides {
            max_epochs: Some(4),
            batch_size_per_gpu: Some(32),
            ..Overrides::default()
        };
        let config =
            load_config_with(temp_file.path(), &overrides, &ComponentRegistry::builtin()).unwrap();
        assert_eq!(config.train.max_epochs, 4);
        assert_eq!(config.train.dataloader.batch_size_per_gpu, 32);
    }
}
