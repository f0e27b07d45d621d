//! Built-in constructors

use super::components::*;
use super::ComponentRegistry;
use crate::config::{positive_count, SchemaError, TypingConfig};
use crate::error::Result;
use std::path::PathBuf;

pub(super) fn register_all(registry: &mut ComponentRegistry) {
    registry.tasks.register("entity-typing", entity_typing);
    registry
        .tasks
        .register("named-entity-recognition", named_entity_recognition);

    registry.tokenizers.register("char", |_| Ok(PreTokenizer::Char));
    registry.tokenizers.register("blank", |_| Ok(PreTokenizer::Blank));

    registry
        .labels
        .register("count_span_labels", |_| Ok(LabelStrategy::CountSpanLabels));
    registry.labels.register("label_file", label_file);

    registry
        .preprocessors
        .register("multilabel-concat-typing-preprocessor", |config| {
            preprocessor(config, PreprocessorKind::MultiLabelConcatTyping)
        });
    registry
        .preprocessors
        .register("multilabel-span-typing-preprocessor", |config| {
            preprocessor(config, PreprocessorKind::MultiLabelSpanTyping)
        });
    registry
        .preprocessors
        .register("sequence-labeling-preprocessor", |config| {
            preprocessor(config, PreprocessorKind::SequenceLabeling)
        });

    registry.collators.register(
        "MultiLabelConcatTypingDataCollatorWithPadding",
        |_| Ok(CollatorComponent::MultiLabelConcatTyping),
    );
    registry.collators.register(
        "MultiLabelSpanTypingDataCollatorWithPadding",
        |_| Ok(CollatorComponent::MultiLabelSpanTyping),
    );
    registry.collators.register(
        "SequenceLabelingDataCollatorWithPadding",
        |_| Ok(CollatorComponent::SequenceLabeling),
    );

    registry
        .models
        .register("multilabel-concat-typing-model", |config| {
            model(config, ModelKind::MultiLabelConcatTyping)
        });
    registry
        .models
        .register("multilabel-span-typing-model", |config| {
            model(config, ModelKind::MultiLabelSpanTyping)
        });

    registry
        .decoders
        .register("linear", |_| Ok(DecoderComponent::Linear));

    registry.losses.register("WBCE", |config| {
        Ok(LossComponent::WeightedBce {
            pos_weight: config.model.pos_weight,
        })
    });
    registry.losses.register("BCE", |_| Ok(LossComponent::Bce));

    registry
        .optimizers
        .register("AdamW", |config| optimizer(config, OptimizerKind::AdamW));
    registry
        .optimizers
        .register("Adam", |config| optimizer(config, OptimizerKind::Adam));
    registry
        .optimizers
        .register("SGD", |config| optimizer(config, OptimizerKind::Sgd));

    registry
        .schedulers
        .register("cosine", |config| scheduler(config, SchedulerKind::Cosine));
    registry
        .schedulers
        .register("linear", |config| scheduler(config, SchedulerKind::Linear));
    registry
        .schedulers
        .register("constant", |config| scheduler(config, SchedulerKind::Constant));

    registry
        .metrics
        .register("typing-metric", |_| Ok(MetricComponent::Typing));
}

fn entity_typing(_: &TypingConfig) -> Result<Task> {
    Ok(Task::EntityTyping)
}

fn named_entity_recognition(_: &TypingConfig) -> Result<Task> {
    Ok(Task::NamedEntityRecognition)
}

fn label_file(config: &TypingConfig) -> Result<LabelStrategy> {
    let file = config
        .dataset
        .labels
        .as_ref()
        .and_then(|labels| labels.file.as_deref())
        .filter(|file| !file.trim().is_empty())
        .ok_or(SchemaError::MissingField("dataset.labels.file"))?;
    Ok(LabelStrategy::LabelFile(PathBuf::from(file)))
}

fn preprocessor(config: &TypingConfig, kind: PreprocessorKind) -> Result<PreprocessorComponent> {
    let spec = &config.preprocessor;
    Ok(PreprocessorComponent {
        kind,
        model_dir: spec.model_dir.clone(),
        max_length: positive_count("preprocessor.max_length", spec.max_length)?,
        add_special_tokens: spec.add_special_tokens,
        return_offsets: spec.return_offsets,
    })
}

fn model(config: &TypingConfig, kind: ModelKind) -> Result<ModelComponent> {
    Ok(ModelComponent {
        kind,
        embedder: config.model.embedder.model_name_or_path.clone(),
        word_dropout: config.model.word_dropout,
    })
}

fn optimizer(config: &TypingConfig, kind: OptimizerKind) -> Result<OptimizerComponent> {
    let spec = &config.train.optimizer;
    let betas = spec.betas.map(|[b1, b2]| (b1, b2));

    let (weight_decay, betas) = match kind {
        OptimizerKind::AdamW => (
            spec.weight_decay.unwrap_or(0.01),
            Some(betas.unwrap_or((0.9, 0.999))),
        ),
        OptimizerKind::Adam => (
            spec.weight_decay.unwrap_or(0.0),
            Some(betas.unwrap_or((0.9, 0.999))),
        ),
        OptimizerKind::Sgd => {
            if betas.is_some() {
                tracing::warn!("train.optimizer.betas is ignored by SGD");
            }
            (spec.weight_decay.unwrap_or(0.0), None)
        }
    };

    Ok(OptimizerComponent {
        kind,
        lr: spec.lr,
        weight_decay,
        betas,
    })
}

fn scheduler(config: &TypingConfig, kind: SchedulerKind) -> Result<SchedulerComponent> {
    let spec = config
        .train
        .lr_scheduler
        .as_ref()
        .ok_or(SchemaError::MissingField("train.lr_scheduler"))?;
    Ok(SchedulerComponent {
        kind,
        warmup_rate: spec.warmup_rate,
        by_epoch: spec.options.by_epoch,
    })
}
