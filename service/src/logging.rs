use crate::config::{Config, RustEnv};
use log::{LevelFilter, SetLoggerError};
use simplelog::{self, ColorChoice, ConfigBuilder, TerminalMode};

/// Modules to filter out from logging when not in Trace mode.
/// The database driver and the outbound HTTP stack log every query and
/// handshake at Debug, which buries the federation flow itself.
const FILTERED_MODULES: &[&str] = &["sqlx", "sea_orm", "hyper", "reqwest", "rustls", "oauth2"];

pub struct Logger {}

impl Logger {
    /// Initializes the global terminal logger from the provided Config.
    ///
    /// Fails if a global logger was already installed.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let apply_filters = Self::should_filter_dependencies(config.log_level_filter);
        let log_config = Self::build_log_config(apply_filters);
        let (mode, color) = Self::terminal_for(&config.runtime_env());

        simplelog::TermLogger::init(config.log_level_filter, log_config, mode, color)
    }

    /// Returns `false` for Trace level (show all logs), `true` for all other levels.
    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    /// Production output goes to a log collector, so it is uncolored and on stderr.
    fn terminal_for(env: &RustEnv) -> (TerminalMode, ColorChoice) {
        match env {
            RustEnv::Production => (TerminalMode::Stderr, ColorChoice::Never),
            RustEnv::Development | RustEnv::Staging => (TerminalMode::Mixed, ColorChoice::Auto),
        }
    }

    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
