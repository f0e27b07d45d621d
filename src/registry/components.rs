//! Component descriptors handed to the external trainer
//!
//! These carry resolved, validated parameters only; the trainer owns the
//! actual tokenizers, networks and optimizers.

use serde::Serialize;
use std::path::PathBuf;

/// Task pipeline selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    EntityTyping,
    NamedEntityRecognition,
}

impl Task {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EntityTyping => "entity-typing",
            Self::NamedEntityRecognition => "named-entity-recognition",
        }
    }
}

/// How raw text is split into tokens before sub-word encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreTokenizer {
    /// One token per character
    Char,
    /// Split on single spaces
    Blank,
}

/// Where the label set comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStrategy {
    /// Collect every span type seen in the training split
    CountSpanLabels,
    /// Read one label per line from a file
    LabelFile(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreprocessorKind {
    MultiLabelConcatTyping,
    MultiLabelSpanTyping,
    SequenceLabeling,
}

/// Parameters for the sub-word preprocessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreprocessorComponent {
    pub kind: PreprocessorKind,
    pub model_dir: String,
    pub max_length: usize,
    pub add_special_tokens: bool,
    pub return_offsets: bool,
}

impl PreprocessorComponent {
    /// Sub-token budget left for content once `[CLS]` and `[SEP]` are placed
    pub fn content_length(&self) -> usize {
        if self.add_special_tokens {
            self.max_length.saturating_sub(2)
        } else {
            self.max_length
        }
    }
}

/// Batching/padding strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollatorComponent {
    MultiLabelConcatTyping,
    MultiLabelSpanTyping,
    SequenceLabeling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    MultiLabelConcatTyping,
    MultiLabelSpanTyping,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelComponent {
    pub kind: ModelKind,
    /// Pre-trained encoder name or path
    pub embedder: String,
    pub word_dropout: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderComponent {
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LossComponent {
    /// Binary cross-entropy with positive examples scaled by `pos_weight`
    WeightedBce { pos_weight: f64 },
    Bce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptimizerKind {
    AdamW,
    Adam,
    Sgd,
}

/// Optimizer hyperparameters with per-kind defaults filled in
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimizerComponent {
    pub kind: OptimizerKind,
    pub lr: f64,
    pub weight_decay: f64,
    /// Moment decay rates, for the Adam family
    pub betas: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    Cosine,
    Linear,
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SchedulerComponent {
    pub kind: SchedulerKind,
    pub warmup_rate: f64,
    pub by_epoch: bool,
}

impl SchedulerComponent {
    /// Warmup length for a run of `total_steps`, rounded down
    pub fn warmup_steps(&self, total_steps: usize) -> usize {
        (self.warmup_rate * total_steps as f64).floor() as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricComponent {
    Typing,
}
