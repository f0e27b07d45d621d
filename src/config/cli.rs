//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! typecfg validate configs/entity_typing.yaml
//! typecfg validate configs/entity_typing.yaml --lr 1e-4 --epochs 3
//! typecfg info configs/entity_typing.yaml --format json
//! typecfg setup configs/entity_typing.yaml --mirror ~/.cache/typecfg/mirror --write-run-dir
//! typecfg components --kind optimizer
//! ```

use super::overrides::Overrides;
use crate::registry::ComponentKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// typecfg: entity-typing training configuration front end
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "typecfg")]
#[command(version)]
#[command(about = "Load, validate and wire entity-typing training configurations")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (repeat for trace level)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Load and validate a configuration file
    Validate(ValidateArgs),

    /// Print the resolved configuration
    Info(InfoArgs),

    /// Fetch the dataset and assemble the component pipeline
    Setup(SetupArgs),

    /// List registered component tags
    Components(ComponentsArgs),
}

/// Values that replace the document's own before validation
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct OverrideArgs {
    /// Override work_dir
    #[arg(short, long)]
    pub work_dir: Option<PathBuf>,

    /// Override train.max_epochs
    #[arg(short, long, allow_negative_numbers = true)]
    pub epochs: Option<i64>,

    /// Override train.optimizer.lr
    #[arg(long, allow_negative_numbers = true)]
    pub lr: Option<f64>,

    /// Override train.dataloader.batch_size_per_gpu
    #[arg(short, long, allow_negative_numbers = true)]
    pub batch_size: Option<i64>,
}

impl From<&OverrideArgs> for Overrides {
    fn from(args: &OverrideArgs) -> Self {
        Self {
            work_dir: args.work_dir.clone(),
            max_epochs: args.epochs,
            lr: args.lr,
            batch_size_per_gpu: args.batch_size,
        }
    }
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show the resolved component of every tag
    #[arg(short, long)]
    pub detailed: bool,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for the setup command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SetupArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Directory holding pre-downloaded dataset archives
    #[arg(short, long, value_name = "DIR")]
    pub mirror: Option<PathBuf>,

    /// Create work_dir and record the resolved configuration in it
    #[arg(long)]
    pub write_run_dir: bool,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for the components command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ComponentsArgs {
    /// Only list this kind (task, tokenizer, labels, preprocessor, ...)
    #[arg(short, long)]
    pub kind: Option<ComponentKind>,
}

/// Output format for info command
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Unknown output format: {}. Valid formats: text, json, yaml",
                s
            )),
        }
    }
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn config_path_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9_-]{0,20}\\.(yaml|yml)"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_validate_command_parses(config in config_path_strategy()) {
            let cli = parse_args(["typecfg", "validate", &config]).unwrap();
            match cli.command {
                Command::Validate(args) => {
                    prop_assert_eq!(args.config.to_str().unwrap(), &config);
                }
                _ => prop_assert!(false, "Expected Validate command"),
            }
        }

        #[test]
        fn prop_epochs_override(
            config in config_path_strategy(),
            epochs in -100i64..10000
        ) {
            let epochs_str = epochs.to_string();
            let cli = parse_args(["typecfg", "setup", &config, "--epochs", &epochs_str]).unwrap();
            match cli.command {
                Command::Setup(args) => prop_assert_eq!(args.overrides.epochs, Some(epochs)),
                _ => prop_assert!(false, "Expected Setup command"),
            }
        }

        #[test]
        fn prop_learning_rate_override(
            config in config_path_strategy(),
            lr in 1e-10f64..1.0
        ) {
            let lr_str = lr.to_string();
            let cli = parse_args(["typecfg", "validate", &config, "--lr", &lr_str]).unwrap();
            match cli.command {
                Command::Validate(args) => prop_assert_eq!(args.overrides.lr, Some(lr)),
                _ => prop_assert!(false, "Expected Validate command"),
            }
        }

        #[test]
        fn prop_output_format_case_insensitive(
            format in prop_oneof!["text", "TEXT", "Json", "yaml", "YAML"]
        ) {
            prop_assert!(format.parse::<OutputFormat>().is_ok());
        }
    }
}
