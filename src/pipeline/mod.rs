//! Assemble component descriptors from a loaded configuration
//!
//! Components are built in dependency order:
//! dataset → preprocessor → collator → model → optimizer/scheduler →
//! trainer → evaluator. Every tag is checked against the registry before
//! the first component is built.

mod run_dir;

pub use run_dir::{config_digest, RunDir, RunRecord};

use crate::config::{positive_count, validate_config, DataSplit, TypingConfig};
use crate::dataset::{resolve_sources, DataSource, ResourceFetcher};
use crate::error::Result;
use crate::registry::{
    CollatorComponent, ComponentRegistry, DecoderComponent, LabelStrategy, LossComponent,
    MetricComponent, ModelComponent, OptimizerComponent, PreTokenizer, PreprocessorComponent,
    SchedulerComponent, Task,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Setup stages, in the order they are built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Dataset,
    Preprocessor,
    Collator,
    Model,
    Optimizer,
    Scheduler,
    Trainer,
    Evaluator,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Preprocessor => "preprocessor",
            Self::Collator => "collator",
            Self::Model => "model",
            Self::Optimizer => "optimizer",
            Self::Scheduler => "scheduler",
            Self::Trainer => "trainer",
            Self::Evaluator => "evaluator",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `data_file` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetFile {
    pub split: DataSplit,
    pub source: DataSource,
    /// Readable local copy, once fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetPlan {
    pub files: Vec<DatasetFile>,
    pub tokenizer: Option<PreTokenizer>,
    pub labels: Option<LabelStrategy>,
}

impl DatasetPlan {
    pub fn is_fetched(&self) -> bool {
        self.files.iter().all(|file| file.local_path.is_some())
    }
}

/// Training loop settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainerSettings {
    pub work_dir: PathBuf,
    pub max_epochs: usize,
    pub batch_size_per_gpu: usize,
    pub workers_per_gpu: usize,
}

impl TrainerSettings {
    /// Optimizer steps per epoch, counting a trailing partial batch
    #[must_use]
    pub fn steps_per_epoch(&self, num_examples: usize, num_gpus: usize) -> usize {
        let global_batch = self.batch_size_per_gpu.saturating_mul(num_gpus.max(1));
        num_examples.div_ceil(global_batch)
    }

    #[must_use]
    pub fn total_steps(&self, num_examples: usize, num_gpus: usize) -> usize {
        self.steps_per_epoch(num_examples, num_gpus)
            .saturating_mul(self.max_epochs)
    }
}

/// Every component a training run needs, resolved and parameterized
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipeline {
    pub task: Task,
    pub dataset: DatasetPlan,
    pub preprocessor: PreprocessorComponent,
    pub collator: CollatorComponent,
    pub model: ModelComponent,
    pub decoder: DecoderComponent,
    pub loss: LossComponent,
    pub optimizer: OptimizerComponent,
    /// Absent means a constant learning rate
    pub scheduler: Option<SchedulerComponent>,
    pub trainer: TrainerSettings,
    pub metric: MetricComponent,
    /// Stages in the order they were built
    pub stages: Vec<Stage>,
}

impl Pipeline {
    /// Warmup length for a run over `num_examples` examples
    pub fn warmup_steps(&self, num_examples: usize, num_gpus: usize) -> usize {
        self.scheduler.as_ref().map_or(0, |scheduler| {
            scheduler.warmup_steps(self.trainer.total_steps(num_examples, num_gpus))
        })
    }
}

/// Build every component descriptor without touching the dataset
pub fn build_pipeline(config: &TypingConfig, registry: &ComponentRegistry) -> Result<Pipeline> {
    registry.check(config)?;
    validate_config(config)?;
    let files = dataset_files(config)?;
    assemble(config, registry, files)
}

/// Fetch the dataset, then build every component descriptor
///
/// The dataset is resolved before anything else, so an unreachable dataset
/// fails setup with no other component built.
pub fn setup<F>(config: &TypingConfig, registry: &ComponentRegistry, fetcher: &F) -> Result<Pipeline>
where
    F: ResourceFetcher + ?Sized,
{
    registry.check(config)?;
    validate_config(config)?;

    let mut files = dataset_files(config)?;
    for file in &mut files {
        let path = fetcher.fetch(&file.source)?;
        tracing::info!(split = %file.split, path = %path.display(), "dataset ready");
        file.local_path = Some(path);
    }

    let pipeline = assemble(config, registry, files)?;
    tracing::info!(
        task = pipeline.task.as_str(),
        stages = pipeline.stages.len(),
        "pipeline assembled"
    );
    Ok(pipeline)
}

fn dataset_files(config: &TypingConfig) -> Result<Vec<DatasetFile>> {
    let sources = resolve_sources(&config.dataset.data_file)?;
    Ok(sources
        .into_iter()
        .map(|(split, source)| DatasetFile {
            split,
            source,
            local_path: None,
        })
        .collect())
}

fn assemble(
    config: &TypingConfig,
    registry: &ComponentRegistry,
    files: Vec<DatasetFile>,
) -> Result<Pipeline> {
    let mut stages = Vec::with_capacity(8);

    let task = registry.tasks.build("task", &config.task, config)?;

    let tokenizer = config
        .dataset
        .tokenizer
        .as_deref()
        .map(|name| registry.tokenizers.build("dataset.tokenizer", name, config))
        .transpose()?;
    let labels = config
        .dataset
        .labels
        .as_ref()
        .map(|labels| registry.labels.build("dataset.labels.type", &labels.kind, config))
        .transpose()?;
    let dataset = DatasetPlan {
        files,
        tokenizer,
        labels,
    };
    stages.push(Stage::Dataset);

    let preprocessor =
        registry
            .preprocessors
            .build("preprocessor.type", &config.preprocessor.kind, config)?;
    stages.push(Stage::Preprocessor);

    let collator = registry
        .collators
        .build("data_collator", &config.data_collator, config)?;
    stages.push(Stage::Collator);

    let model = registry.models.build("model.type", &config.model.kind, config)?;
    let decoder = registry
        .decoders
        .build("model.decoder.type", &config.model.decoder.kind, config)?;
    let loss = registry
        .losses
        .build("model.loss_function", &config.model.loss_function, config)?;
    stages.push(Stage::Model);

    let optimizer = registry
        .optimizers
        .build("train.optimizer.type", &config.train.optimizer.kind, config)?;
    stages.push(Stage::Optimizer);

    let scheduler = match &config.train.lr_scheduler {
        Some(spec) => {
            let scheduler = registry
                .schedulers
                .build("train.lr_scheduler.type", &spec.kind, config)?;
            stages.push(Stage::Scheduler);
            Some(scheduler)
        }
        None => None,
    };

    let trainer = TrainerSettings {
        work_dir: config.work_dir.clone(),
        max_epochs: positive_count("train.max_epochs", config.train.max_epochs)?,
        batch_size_per_gpu: positive_count(
            "train.dataloader.batch_size_per_gpu",
            config.train.dataloader.batch_size_per_gpu,
        )?,
        workers_per_gpu: config.train.dataloader.workers_per_gpu,
    };
    stages.push(Stage::Trainer);

    let metric = registry
        .metrics
        .build("evaluation.metrics", &config.evaluation.metrics, config)?;
    stages.push(Stage::Evaluator);

    tracing::debug!(?stages, "components built");

    Ok(Pipeline {
        task,
        dataset,
        preprocessor,
        collator,
        model,
        decoder,
        loss,
        optimizer,
        scheduler,
        trainer,
        metric,
        stages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::dataset::{FetchError, MirrorFetcher};
    use crate::error::Error;
    use crate::registry::OptimizerKind;
    use std::fs;
    use tempfile::TempDir;

    const EXAMPLE: &str = include_str!("../../configs/entity_typing.yaml");

    fn example() -> TypingConfig {
        parse_config(EXAMPLE, &ComponentRegistry::builtin()).unwrap()
    }

    fn local_config(dir: &TempDir) -> TypingConfig {
        let data = dir.path().join("toy_wiki.zip");
        fs::write(&data, b"PK").unwrap();
        let yaml = EXAMPLE.replace(
            "'https://www.modelscope.cn/api/v1/datasets/izhx404/toy_msra/repo/files?Revision=master&FilePath=toy_wiki.zip'",
            &format!("'{}'", data.display()),
        );
        parse_config(&yaml, &ComponentRegistry::builtin()).unwrap()
    }

    struct PanickingFetcher;

    impl ResourceFetcher for PanickingFetcher {
        fn fetch(&self, _: &DataSource) -> std::result::Result<PathBuf, FetchError> {
            panic!("fetch must not run");
        }
    }

    fn exploding_preprocessor(_: &TypingConfig) -> Result<PreprocessorComponent> {
        panic!("preprocessor built before the dataset was fetched");
    }

    #[test]
    fn test_build_pipeline_stage_order() {
        let pipeline = build_pipeline(&example(), &ComponentRegistry::builtin()).unwrap();
        assert_eq!(
            pipeline.stages,
            vec![
                Stage::Dataset,
                Stage::Preprocessor,
                Stage::Collator,
                Stage::Model,
                Stage::Optimizer,
                Stage::Scheduler,
                Stage::Trainer,
                Stage::Evaluator,
            ]
        );
        assert!(!pipeline.dataset.is_fetched());
    }

    #[test]
    fn test_build_pipeline_components() {
        let pipeline = build_pipeline(&example(), &ComponentRegistry::builtin()).unwrap();
        assert_eq!(pipeline.task, Task::EntityTyping);
        assert_eq!(pipeline.dataset.tokenizer, Some(PreTokenizer::Char));
        assert_eq!(pipeline.dataset.labels, Some(LabelStrategy::CountSpanLabels));
        assert!(pipeline.dataset.files[0].source.is_remote());
        assert_eq!(pipeline.dataset.files[0].split, DataSplit::All);
        assert_eq!(pipeline.loss, LossComponent::WeightedBce { pos_weight: 2.0 });
        assert_eq!(pipeline.optimizer.kind, OptimizerKind::AdamW);
        assert_eq!(pipeline.trainer.max_epochs, 1);
        assert_eq!(pipeline.trainer.batch_size_per_gpu, 16);
        assert_eq!(pipeline.metric, MetricComponent::Typing);
    }

    #[test]
    fn test_no_scheduler_stage_without_scheduler() {
        let mut config = example();
        config.train.lr_scheduler = None;
        let pipeline = build_pipeline(&config, &ComponentRegistry::builtin()).unwrap();
        assert!(pipeline.scheduler.is_none());
        assert!(!pipeline.stages.contains(&Stage::Scheduler));
        assert_eq!(pipeline.warmup_steps(1000, 1), 0);
    }

    #[test]
    fn test_setup_local_dataset() {
        let dir = TempDir::new().unwrap();
        let config = local_config(&dir);
        let fetcher = MirrorFetcher::new(dir.path().join("mirror"));

        let pipeline = setup(&config, &ComponentRegistry::builtin(), &fetcher).unwrap();
        assert!(pipeline.dataset.is_fetched());
        assert_eq!(pipeline.stages.first(), Some(&Stage::Dataset));
        assert_eq!(
            pipeline.dataset.files[0].local_path.as_deref(),
            Some(dir.path().join("toy_wiki.zip").as_path())
        );
    }

    #[test]
    fn test_setup_unreachable_dataset_builds_nothing() {
        let mirror = TempDir::new().unwrap();
        let fetcher = MirrorFetcher::new(mirror.path());
        let config = example();

        let mut registry = ComponentRegistry::builtin();
        registry
            .preprocessors
            .register(config.preprocessor.kind.clone(), exploding_preprocessor);

        let err = setup(&config, &registry, &fetcher).unwrap_err();
        assert!(matches!(
            err,
            Error::ResourceFetch(FetchError::Unreachable { .. })
        ));
    }

    #[test]
    fn test_unknown_tag_fails_before_fetch() {
        let mut config = example();
        config.model.kind = "does-not-exist".to_string();
        let err = setup(&config, &ComponentRegistry::builtin(), &PanickingFetcher).unwrap_err();
        assert!(matches!(err, Error::TypeResolution(_)));
    }

    #[test]
    fn test_steps_per_epoch() {
        let trainer = TrainerSettings {
            work_dir: PathBuf::from("runs"),
            max_epochs: 3,
            batch_size_per_gpu: 16,
            workers_per_gpu: 0,
        };
        assert_eq!(trainer.steps_per_epoch(100, 1), 7);
        assert_eq!(trainer.steps_per_epoch(96, 1), 6);
        assert_eq!(trainer.steps_per_epoch(100, 2), 4);
        assert_eq!(trainer.steps_per_epoch(100, 0), 7);
        assert_eq!(trainer.steps_per_epoch(0, 1), 0);
        assert_eq!(trainer.total_steps(100, 1), 21);
    }

    #[test]
    fn test_out_of_range_value_fails_before_fetch() {
        let mut config = example();
        config.train.optimizer.lr = -1.0;
        let err = setup(&config, &ComponentRegistry::builtin(), &PanickingFetcher).unwrap_err();
        match err {
            Error::ValueRange(e) => assert_eq!(e.field, "train.optimizer.lr"),
            other => panic!("Expected ValueRange, got {other:?}"),
        }
    }

    #[test]
    fn test_build_pipeline_rejects_warmup_above_one() {
        let mut config = example();
        if let Some(scheduler) = config.train.lr_scheduler.as_mut() {
            scheduler.warmup_rate = 1.5;
        }
        let err = build_pipeline(&config, &ComponentRegistry::builtin()).unwrap_err();
        match err {
            Error::ValueRange(e) => assert_eq!(e.field, "train.lr_scheduler.warmup_rate"),
            other => panic!("Expected ValueRange, got {other:?}"),
        }
    }

    #[test]
    fn test_step_counts_saturate() {
        let trainer = TrainerSettings {
            work_dir: PathBuf::from("runs"),
            max_epochs: usize::MAX,
            batch_size_per_gpu: 16,
            workers_per_gpu: 0,
        };
        assert_eq!(trainer.steps_per_epoch(100, usize::MAX), 1);
        assert_eq!(trainer.total_steps(usize::MAX, 1), usize::MAX);
    }

    #[test]
    fn test_pipeline_warmup_steps() {
        let pipeline = build_pipeline(&example(), &ComponentRegistry::builtin()).unwrap();
        // 1000 examples / 16 per batch = 63 steps, one epoch, 10% warmup
        assert_eq!(pipeline.warmup_steps(1000, 1), 6);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Dataset.to_string(), "dataset");
        assert_eq!(serde_json::to_string(&Stage::Evaluator).unwrap(), "\"evaluator\"");
    }
}
