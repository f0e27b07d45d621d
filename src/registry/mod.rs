//! Component registry
//!
//! Every `type` tag (and every other enum-valued field) in a document names a
//! constructor registered here. Lookup is a pure name → constructor map with
//! one table per component kind; an unknown tag fails at load time, before
//! any component is built.

mod builtin;
mod components;

pub use components::{
    CollatorComponent, DecoderComponent, LabelStrategy, LossComponent, MetricComponent,
    ModelComponent, ModelKind, OptimizerComponent, OptimizerKind, PreTokenizer,
    PreprocessorComponent, PreprocessorKind, SchedulerComponent, SchedulerKind, Task,
};

use crate::config::TypingConfig;
use crate::error::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Builds one component from the whole document
pub type Constructor<T> = fn(&TypingConfig) -> Result<T>;

/// Component families a document refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    Task,
    Tokenizer,
    Labels,
    Preprocessor,
    DataCollator,
    Model,
    Decoder,
    Loss,
    Optimizer,
    LrScheduler,
    Metric,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 11] = [
        Self::Task,
        Self::Tokenizer,
        Self::Labels,
        Self::Preprocessor,
        Self::DataCollator,
        Self::Model,
        Self::Decoder,
        Self::Loss,
        Self::Optimizer,
        Self::LrScheduler,
        Self::Metric,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Tokenizer => "tokenizer",
            Self::Labels => "labels",
            Self::Preprocessor => "preprocessor",
            Self::DataCollator => "data_collator",
            Self::Model => "model",
            Self::Decoder => "decoder",
            Self::Loss => "loss",
            Self::Optimizer => "optimizer",
            Self::LrScheduler => "lr_scheduler",
            Self::Metric => "metric",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!(
                    "Unknown component kind: {}. Valid kinds: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}

/// A tag with no registered implementation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown {kind} '{name}' at {field}. Registered: {}", .known.join(", "))]
pub struct TypeResolutionError {
    pub kind: ComponentKind,
    pub field: &'static str,
    pub name: String,
    pub known: Vec<String>,
}

/// Tags of one component kind mapped to their constructors
pub struct Table<T> {
    kind: ComponentKind,
    entries: BTreeMap<String, Constructor<T>>,
}

impl<T> Table<T> {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Register a constructor, returning the one it replaces
    pub fn register(
        &mut self,
        name: impl Into<String>,
        constructor: Constructor<T>,
    ) -> Option<Constructor<T>> {
        self.entries.insert(name.into(), constructor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered tags in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Look up the constructor for `name`, reporting `field` on failure
    pub fn resolve(
        &self,
        field: &'static str,
        name: &str,
    ) -> std::result::Result<Constructor<T>, TypeResolutionError> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| TypeResolutionError {
                kind: self.kind,
                field,
                name: name.to_string(),
                known: self.entries.keys().cloned().collect(),
            })
    }

    /// Resolve and run the constructor
    pub fn build(&self, field: &'static str, name: &str, config: &TypingConfig) -> Result<T> {
        let constructor = self.resolve(field, name)?;
        constructor(config)
    }
}

impl<T> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("kind", &self.kind)
            .field("names", &self.names())
            .finish()
    }
}

/// One tag occurrence in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTag<'a> {
    pub kind: ComponentKind,
    pub field: &'static str,
    pub name: &'a str,
}

impl<'a> TypeTag<'a> {
    fn new(kind: ComponentKind, field: &'static str, name: &'a str) -> Self {
        Self { kind, field, name }
    }
}

/// Every tag a document refers to, in setup order
pub fn type_tags(config: &TypingConfig) -> Vec<TypeTag<'_>> {
    let mut tags = vec![TypeTag::new(ComponentKind::Task, "task", &config.task)];
    if let Some(tokenizer) = &config.dataset.tokenizer {
        tags.push(TypeTag::new(ComponentKind::Tokenizer, "dataset.tokenizer", tokenizer));
    }
    if let Some(labels) = &config.dataset.labels {
        tags.push(TypeTag::new(ComponentKind::Labels, "dataset.labels.type", &labels.kind));
    }
    tags.extend([
        TypeTag::new(
            ComponentKind::Preprocessor,
            "preprocessor.type",
            &config.preprocessor.kind,
        ),
        TypeTag::new(ComponentKind::DataCollator, "data_collator", &config.data_collator),
        TypeTag::new(ComponentKind::Model, "model.type", &config.model.kind),
        TypeTag::new(
            ComponentKind::Decoder,
            "model.decoder.type",
            &config.model.decoder.kind,
        ),
        TypeTag::new(
            ComponentKind::Loss,
            "model.loss_function",
            &config.model.loss_function,
        ),
        TypeTag::new(
            ComponentKind::Optimizer,
            "train.optimizer.type",
            &config.train.optimizer.kind,
        ),
    ]);
    if let Some(scheduler) = &config.train.lr_scheduler {
        tags.push(TypeTag::new(
            ComponentKind::LrScheduler,
            "train.lr_scheduler.type",
            &scheduler.kind,
        ));
    }
    tags.push(TypeTag::new(
        ComponentKind::Metric,
        "evaluation.metrics",
        &config.evaluation.metrics,
    ));
    tags
}

/// All constructor tables
#[derive(Debug)]
pub struct ComponentRegistry {
    pub tasks: Table<Task>,
    pub tokenizers: Table<PreTokenizer>,
    pub labels: Table<LabelStrategy>,
    pub preprocessors: Table<PreprocessorComponent>,
    pub collators: Table<CollatorComponent>,
    pub models: Table<ModelComponent>,
    pub decoders: Table<DecoderComponent>,
    pub losses: Table<LossComponent>,
    pub optimizers: Table<OptimizerComponent>,
    pub schedulers: Table<SchedulerComponent>,
    pub metrics: Table<MetricComponent>,
}

impl ComponentRegistry {
    /// A registry with no constructors at all
    pub fn empty() -> Self {
        Self {
            tasks: Table::new(ComponentKind::Task),
            tokenizers: Table::new(ComponentKind::Tokenizer),
            labels: Table::new(ComponentKind::Labels),
            preprocessors: Table::new(ComponentKind::Preprocessor),
            collators: Table::new(ComponentKind::DataCollator),
            models: Table::new(ComponentKind::Model),
            decoders: Table::new(ComponentKind::Decoder),
            losses: Table::new(ComponentKind::Loss),
            optimizers: Table::new(ComponentKind::Optimizer),
            schedulers: Table::new(ComponentKind::LrScheduler),
            metrics: Table::new(ComponentKind::Metric),
        }
    }

    /// A registry holding every built-in component
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        builtin::register_all(&mut registry);
        registry
    }

    pub fn contains(&self, kind: ComponentKind, name: &str) -> bool {
        match kind {
            ComponentKind::Task => self.tasks.contains(name),
            ComponentKind::Tokenizer => self.tokenizers.contains(name),
            ComponentKind::Labels => self.labels.contains(name),
            ComponentKind::Preprocessor => self.preprocessors.contains(name),
            ComponentKind::DataCollator => self.collators.contains(name),
            ComponentKind::Model => self.models.contains(name),
            ComponentKind::Decoder => self.decoders.contains(name),
            ComponentKind::Loss => self.losses.contains(name),
            ComponentKind::Optimizer => self.optimizers.contains(name),
            ComponentKind::LrScheduler => self.schedulers.contains(name),
            ComponentKind::Metric => self.metrics.contains(name),
        }
    }

    pub fn names(&self, kind: ComponentKind) -> Vec<&str> {
        match kind {
            ComponentKind::Task => self.tasks.names(),
            ComponentKind::Tokenizer => self.tokenizers.names(),
            ComponentKind::Labels => self.labels.names(),
            ComponentKind::Preprocessor => self.preprocessors.names(),
            ComponentKind::DataCollator => self.collators.names(),
            ComponentKind::Model => self.models.names(),
            ComponentKind::Decoder => self.decoders.names(),
            ComponentKind::Loss => self.losses.names(),
            ComponentKind::Optimizer => self.optimizers.names(),
            ComponentKind::LrScheduler => self.schedulers.names(),
            ComponentKind::Metric => self.metrics.names(),
        }
    }

    /// Check that every tag in the document is registered, without building
    /// anything.
    pub fn check(&self, config: &TypingConfig) -> std::result::Result<(), TypeResolutionError> {
        for tag in type_tags(config) {
            if !self.contains(tag.kind, tag.name) {
                tracing::debug!(kind = %tag.kind, field = tag.field, name = tag.name, "unresolved tag");
                return Err(TypeResolutionError {
                    kind: tag.kind,
                    field: tag.field,
                    name: tag.name.to_string(),
                    known: self
                        .names(tag.kind)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                });
            }
        }
        Ok(())
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
