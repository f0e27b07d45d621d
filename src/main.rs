//! typecfg CLI
//!
//! Front end for entity-typing training configurations.
//!
//! # Usage
//!
//! ```bash
//! # Validate a config
//! typecfg validate configs/entity_typing.yaml
//!
//! # Validate with overrides and show every resolved component
//! typecfg validate configs/entity_typing.yaml --epochs 10 --lr 0.001 --detailed
//!
//! # Show config info
//! typecfg info configs/entity_typing.yaml --format yaml
//!
//! # Fetch the dataset from a mirror and record the run
//! typecfg setup configs/entity_typing.yaml --mirror /data/mirror --write-run-dir
//!
//! # List registered components
//! typecfg components
//! ```

use clap::Parser;
use std::process::ExitCode;
use typing_config::config::{
    load_config_with, Cli, Command, ComponentsArgs, InfoArgs, OutputFormat, Overrides, SetupArgs,
    TypingConfig, ValidateArgs,
};
use typing_config::dataset::MirrorFetcher;
use typing_config::logging::{init_logging, LogLevel};
use typing_config::pipeline::{build_pipeline, setup, Pipeline, RunDir};
use typing_config::registry::{ComponentKind, ComponentRegistry};
use typing_config::{Error, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = LogLevel::from_flags(cli.verbose, cli.quiet);
    init_logging(level);

    let registry = ComponentRegistry::builtin();
    let result = match cli.command {
        Command::Validate(args) => run_validate(&args, &registry, level),
        Command::Info(args) => run_info(&args, &registry),
        Command::Setup(args) => run_setup(&args, &registry, level),
        Command::Components(args) => run_components(&args, &registry),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn say(level: LogLevel, msg: &str) {
    if level != LogLevel::Quiet {
        println!("{msg}");
    }
}

fn run_validate(args: &ValidateArgs, registry: &ComponentRegistry, level: LogLevel) -> Result<()> {
    say(level, &format!("Validating config: {}", args.config.display()));

    let config = load_config_with(&args.config, &Overrides::from(&args.overrides), registry)?;
    say(level, "Configuration is valid");

    if args.detailed {
        let pipeline = build_pipeline(&config, registry)?;
        println!();
        print_pipeline(&config, &pipeline);
    }

    Ok(())
}

fn run_info(args: &InfoArgs, registry: &ComponentRegistry) -> Result<()> {
    let config = load_config_with(&args.config, &Overrides::from(&args.overrides), registry)?;

    match args.format {
        OutputFormat::Text => print_summary(&config),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&config)
                .map_err(|e| Error::Serialization(e.to_string()))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = config
                .to_yaml_string()
                .map_err(|e| Error::Serialization(e.to_string()))?;
            print!("{yaml}");
        }
    }

    Ok(())
}

fn run_setup(args: &SetupArgs, registry: &ComponentRegistry, level: LogLevel) -> Result<()> {
    let config = load_config_with(&args.config, &Overrides::from(&args.overrides), registry)?;

    let fetcher = match &args.mirror {
        Some(dir) => MirrorFetcher::new(dir),
        None => MirrorFetcher::default(),
    };
    let pipeline = setup(&config, registry, &fetcher)?;

    say(level, "Setup complete");
    if level != LogLevel::Quiet {
        print_pipeline(&config, &pipeline);
    }

    if args.write_run_dir {
        let run_dir = RunDir::prepare(&config.work_dir)?;
        let record = run_dir.record(&config, &pipeline)?;
        say(
            level,
            &format!(
                "Run recorded in {} (config sha256 {})",
                run_dir.path().display(),
                record.config_sha256
            ),
        );
    }

    Ok(())
}

fn run_components(args: &ComponentsArgs, registry: &ComponentRegistry) -> Result<()> {
    let kinds: Vec<ComponentKind> = match args.kind {
        Some(kind) => vec![kind],
        None => ComponentKind::ALL.to_vec(),
    };

    for kind in kinds {
        println!("{kind}:");
        for name in registry.names(kind) {
            println!("  {name}");
        }
    }

    Ok(())
}

fn print_summary(config: &TypingConfig) {
    println!("Configuration Info:");
    println!();
    println!("Task: {}", config.task);
    println!("Work dir: {}", config.work_dir.display());
    for (split, raw) in config.dataset.data_file.entries() {
        println!("Data ({split}): {raw}");
    }
    println!(
        "Preprocessor: {} ({}, max_length={})",
        config.preprocessor.kind, config.preprocessor.model_dir, config.preprocessor.max_length
    );
    println!(
        "Model: {} ({})",
        config.model.kind, config.model.embedder.model_name_or_path
    );
    println!(
        "Loss: {} (pos_weight={})",
        config.model.loss_function, config.model.pos_weight
    );
    println!(
        "Optimizer: {} (lr={})",
        config.train.optimizer.kind, config.train.optimizer.lr
    );
    if let Some(scheduler) = &config.train.lr_scheduler {
        println!(
            "Scheduler: {} (warmup_rate={}, by_epoch={})",
            scheduler.kind, scheduler.warmup_rate, scheduler.options.by_epoch
        );
    }
    println!("Epochs: {}", config.train.max_epochs);
    println!(
        "Batch size per GPU: {}",
        config.train.dataloader.batch_size_per_gpu
    );
    println!("Metric: {}", config.evaluation.metrics);
}

fn print_pipeline(config: &TypingConfig, pipeline: &Pipeline) {
    println!("Pipeline ({}):", pipeline.task.as_str());
    for file in &pipeline.dataset.files {
        match &file.local_path {
            Some(path) => println!("  dataset[{}]: {} -> {}", file.split, file.source, path.display()),
            None => println!("  dataset[{}]: {}", file.split, file.source),
        }
    }
    if let Some(tokenizer) = pipeline.dataset.tokenizer {
        println!("  tokenizer: {tokenizer:?}");
    }
    if let Some(labels) = &pipeline.dataset.labels {
        println!("  labels: {labels:?}");
    }
    println!(
        "  preprocessor: {:?} (content length {})",
        pipeline.preprocessor.kind,
        pipeline.preprocessor.content_length()
    );
    println!("  collator: {:?}", pipeline.collator);
    println!(
        "  model: {:?} + {:?} decoder, loss {:?}",
        pipeline.model.kind, pipeline.decoder, pipeline.loss
    );
    println!(
        "  optimizer: {:?} (lr={}, weight_decay={})",
        pipeline.optimizer.kind, pipeline.optimizer.lr, pipeline.optimizer.weight_decay
    );
    match &pipeline.scheduler {
        Some(scheduler) => println!(
            "  scheduler: {:?} (warmup_rate={}, by_epoch={})",
            scheduler.kind, scheduler.warmup_rate, scheduler.by_epoch
        ),
        None => println!("  scheduler: constant"),
    }
    println!(
        "  trainer: {} epochs x {} per GPU, work_dir {}",
        pipeline.trainer.max_epochs,
        pipeline.trainer.batch_size_per_gpu,
        config.work_dir.display()
    );
    println!("  evaluator: {:?}", pipeline.metric);

    let stages: Vec<&str> = pipeline.stages.iter().map(|s| s.as_str()).collect();
    println!("  stages: {}", stages.join(" -> "));
}
