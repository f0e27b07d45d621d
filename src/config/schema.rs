//! YAML schema for the entity-typing training document

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Structural problems in the document: malformed YAML, unknown or missing
/// keys, wrong value types, empty required strings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("{message}")]
    Malformed {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    #[error("Empty required field: {0}")]
    EmptyRequiredField(&'static str),

    #[error("Missing field required by the selected component: {0}")]
    MissingField(&'static str),
}

impl From<serde_yaml::Error> for SchemaError {
    fn from(err: serde_yaml::Error) -> Self {
        let location = err.location();
        Self::Malformed {
            message: err.to_string(),
            line: location.as_ref().map(serde_yaml::Location::line),
            column: location.as_ref().map(serde_yaml::Location::column),
        }
    }
}

/// Complete training document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypingConfig {
    /// Base directory for run artifacts
    pub work_dir: PathBuf,

    /// Task identifier, e.g. `entity-typing`
    pub task: String,

    /// Data source and label extraction
    pub dataset: DatasetSpec,

    /// Preprocessor selection and parameters
    pub preprocessor: PreprocessorSpec,

    /// Batching/padding strategy name
    pub data_collator: String,

    /// Model selection and parameters
    pub model: ModelSpec,

    /// Training loop settings
    pub train: TrainSpec,

    /// Evaluation settings
    pub evaluation: EvaluationSpec,
}

impl TypingConfig {
    /// Parse a document, rejecting unknown keys and empty required strings.
    ///
    /// Defaults are applied here; type tags and numeric ranges are checked
    /// later by the loader.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.check_required_strings()?;
        config.check_label_source()?;
        Ok(config)
    }

    /// Serialize back to YAML with every default spelled out
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    fn check_required_strings(&self) -> Result<(), SchemaError> {
        let required: [(&'static str, bool); 8] = [
            ("work_dir", self.work_dir.as_os_str().is_empty()),
            ("task", self.task.trim().is_empty()),
            ("preprocessor.model_dir", self.preprocessor.model_dir.trim().is_empty()),
            ("data_collator", self.data_collator.trim().is_empty()),
            (
                "model.embedder.model_name_or_path",
                self.model.embedder.model_name_or_path.trim().is_empty(),
            ),
            ("model.loss_function", self.model.loss_function.trim().is_empty()),
            ("evaluation.metrics", self.evaluation.metrics.trim().is_empty()),
            (
                "dataset.data_file",
                self.dataset
                    .data_file
                    .entries()
                    .iter()
                    .any(|(_, raw)| raw.trim().is_empty()),
            ),
        ];

        match required.iter().find(|(_, empty)| *empty) {
            Some((field, _)) => Err(SchemaError::EmptyRequiredField(*field)),
            None => Ok(()),
        }
    }

    /// `label_file` labels are read from `dataset.labels.file`
    fn check_label_source(&self) -> Result<(), SchemaError> {
        match &self.dataset.labels {
            Some(labels) if labels.kind == "label_file" => match labels.file.as_deref() {
                Some(file) if !file.trim().is_empty() => Ok(()),
                _ => Err(SchemaError::MissingField("dataset.labels.file")),
            },
            _ => Ok(()),
        }
    }
}

/// Dataset section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetSpec {
    /// Archive URL/path, or one URL/path per split
    pub data_file: DataFile,

    /// Pre-tokenizer for raw text (`char`, `blank`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<String>,

    /// Label extraction strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<LabelsSpec>,
}

/// Which part of the corpus a data file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSplit {
    /// A single archive with every split inside
    All,
    Train,
    Valid,
    Test,
}

impl DataSplit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Train => "train",
            Self::Valid => "valid",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Display for DataSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `data_file` accepts either a single location or a per-split mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataFile {
    Single(String),
    Splits(SplitFiles),
}

/// Per-split data locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitFiles {
    pub train: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
}

impl DataFile {
    /// Every declared location, tagged with its split
    pub fn entries(&self) -> Vec<(DataSplit, &str)> {
        match self {
            Self::Single(raw) => vec![(DataSplit::All, raw.as_str())],
            Self::Splits(files) => {
                let mut entries = vec![(DataSplit::Train, files.train.as_str())];
                if let Some(valid) = &files.valid {
                    entries.push((DataSplit::Valid, valid.as_str()));
                }
                if let Some(test) = &files.test {
                    entries.push((DataSplit::Test, test.as_str()));
                }
                entries
            }
        }
    }
}

/// Label extraction strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelsSpec {
    #[serde(rename = "type")]
    pub kind: String,

    /// Label list file, for `label_file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Preprocessor section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreprocessorSpec {
    #[serde(rename = "type")]
    pub kind: String,

    /// Pre-trained model name or path providing the sub-word vocabulary
    pub model_dir: String,

    /// Sub-tokens beyond this length are discarded
    #[serde(default = "default_max_length")]
    pub max_length: i64,

    /// Wrap inputs with the model's special tokens
    #[serde(default = "default_true")]
    pub add_special_tokens: bool,

    /// Emit sub-token offset mappings
    #[serde(default)]
    pub return_offsets: bool,
}

/// Model section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    #[serde(rename = "type")]
    pub kind: String,

    pub embedder: EmbedderSpec,

    /// Probability of dropping whole word embeddings
    #[serde(default)]
    pub word_dropout: f64,

    pub decoder: DecoderSpec,

    /// Loss tag, e.g. `WBCE`
    pub loss_function: String,

    /// Positive-class weight for weighted BCE
    #[serde(default = "default_pos_weight")]
    pub pos_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedderSpec {
    pub model_name_or_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecoderSpec {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Training loop section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainSpec {
    pub max_epochs: i64,

    pub dataloader: DataloaderSpec,

    pub optimizer: OptimizerSpec,

    /// Absent means a constant learning rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lr_scheduler: Option<SchedulerSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataloaderSpec {
    pub batch_size_per_gpu: i64,

    #[serde(default)]
    pub workers_per_gpu: usize,
}

/// Optimizer specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizerSpec {
    /// Optimizer tag: `AdamW` | `Adam` | `SGD`
    #[serde(rename = "type")]
    pub kind: String,

    /// Learning rate
    pub lr: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_decay: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub betas: Option<[f64; 2]>,
}

/// Learning rate scheduler specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerSpec {
    #[serde(rename = "type")]
    pub kind: String,

    /// Fraction of total steps spent warming up
    #[serde(default)]
    pub warmup_rate: f64,

    #[serde(default)]
    pub options: SchedulerOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerOptions {
    /// Step the schedule once per epoch instead of once per batch
    #[serde(default = "default_true")]
    pub by_epoch: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            by_epoch: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationSpec {
    pub metrics: String,
}

fn default_true() -> bool {
    true
}

fn default_max_length() -> i64 {
    512
}

fn default_pos_weight() -> f64 {
    1.0
}
