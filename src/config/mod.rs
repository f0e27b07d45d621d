//! Declarative YAML configuration for entity-typing training
//!
//! A document names every component by tag and carries its parameters.
//! Loading runs three phases (schema, type resolution, value ranges) and
//! stops at the first failure.
//!
//! # Example
//!
//! ```yaml
//! work_dir: experiments/toy_wiki
//! task: entity-typing
//! dataset:
//!   data_file: data/toy_wiki.zip
//!   tokenizer: char
//!   labels:
//!     type: count_span_labels
//! preprocessor:
//!   type: multilabel-concat-typing-preprocessor
//!   model_dir: bert-base-cased
//!   max_length: 150
//! data_collator: MultiLabelConcatTypingDataCollatorWithPadding
//! model:
//!   type: multilabel-concat-typing-model
//!   embedder:
//!     model_name_or_path: bert-base-cased
//!   decoder:
//!     type: linear
//!   loss_function: WBCE
//!   pos_weight: 2
//! train:
//!   max_epochs: 1
//!   dataloader:
//!     batch_size_per_gpu: 16
//!   optimizer:
//!     type: AdamW
//!     lr: 5.0e-5
//! evaluation:
//!   metrics: typing-metric
//! ```

mod cli;
mod load;
mod overrides;
mod schema;
mod validate;



pub use cli::{
    parse_args, Cli, Command, ComponentsArgs, InfoArgs, OutputFormat, OverrideArgs, SetupArgs,
    ValidateArgs,
};
pub use load::{load_config, load_config_with, parse_config, parse_config_with};
pub use overrides::Overrides;
pub use schema::{
    DataFile, DataSplit, DataloaderSpec, DatasetSpec, DecoderSpec, EmbedderSpec, EvaluationSpec,
    LabelsSpec, ModelSpec, OptimizerSpec, PreprocessorSpec, SchedulerOptions, SchedulerSpec,
    SchemaError, SplitFiles, TrainSpec, TypingConfig,
};
pub use validate::{validate_config, ValueRangeError};
pub(crate) use validate::positive_count;
