//! # typing-config: entity-typing training configuration front end
//!
//! Loads the YAML document that drives an entity-typing training run,
//! checks it, and turns it into parameterized component descriptors for an
//! external trainer.
//!
//! ## Architecture
//!
//! - **config**: Document schema, loading, value validation and CLI arguments
//! - **registry**: Tag → constructor tables for every component kind
//! - **dataset**: Data source classification and offline fetching
//! - **pipeline**: Dependency-ordered assembly and run directories
//! - **logging**: `tracing` subscriber setup
//!
//! ## Example
//!
//! ```no_run
//! use typing_config::config::load_config;
//! use typing_config::pipeline::build_pipeline;
//! use typing_config::registry::ComponentRegistry;
//!
//! let config = load_config("configs/entity_typing.yaml")?;
//! let pipeline = build_pipeline(&config, &ComponentRegistry::builtin())?;
//! println!("{} stages", pipeline.stages.len());
//! # Ok::<(), typing_config::Error>(())
//! ```

pub mod config;
pub mod dataset;
pub mod logging;
pub mod pipeline;
pub mod registry;

pub mod error;

// Re-export commonly used types
pub use config::{load_config, parse_config, TypingConfig};
pub use error::{Error, Result};
pub use pipeline::{build_pipeline, setup, Pipeline};
pub use registry::ComponentRegistry;
