//! Structured logging setup for the `typecfg` binary

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level selected by `-v`/`-q`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Quiet,
    Normal,
    Verbose,
    Trace,
}

impl LogLevel {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Default filter directive, used when `RUST_LOG` is unset
    pub fn directive(self) -> String {
        let level = self.level();
        format!("typing_config={level},typecfg={level}")
    }
}

/// Install a stderr subscriber; `RUST_LOG` overrides the flag-derived level.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::trace!(?level, "logging initialised");
    }
}
