//! Routing of crate and FMU log records to an injected sink.
//!
//! Everything in this crate logs through the `log` facade. Messages emitted by an FMU arrive
//! through the native logger callback with the instance name as their target. A host that
//! renders log output itself (a GUI console, for instance) provides a [`LogSink`] and installs
//! a [`SinkLogger`]; a command-line host uses [`LogConfig::spec`] with any `log` backend.

use std::fmt::Display;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Module path given to records emitted by the native logger callbacks.
const FMU_MODULE_PATH: &str = "logger";

/// Which part of the system a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    /// Message from the FMU itself
    Fmu,
    /// Loading and instantiating a model
    Loading,
    /// Stepping and time keeping
    Simulation,
    Input,
    Visualization,
    General,
}

impl LogCategory {
    pub fn from_target(target: &str) -> Self {
        let Some(module) = target.strip_prefix("fmivis") else {
            return Self::Fmu;
        };
        let module = module.trim_start_matches("::");
        let head = module.split("::").next().unwrap_or_default();
        match head {
            "import" | "fmi1" | "fmi2" => Self::Loading,
            "driver" | "time" | "settings" => Self::Simulation,
            "input" => Self::Input,
            "visual" => Self::Visualization,
            // The crate root, `handle`, and other workspace crates such as `fmivis_sim`
            _ => Self::General,
        }
    }

    fn of(record: &Record) -> Self {
        if record.module_path() == Some(FMU_MODULE_PATH) {
            Self::Fmu
        } else {
            Self::from_target(record.target())
        }
    }
}

impl Display for LogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogCategory::Fmu => "fmu",
            LogCategory::Loading => "loading",
            LogCategory::Simulation => "simulation",
            LogCategory::Input => "input",
            LogCategory::Visualization => "visualization",
            LogCategory::General => "general",
        };
        f.write_str(name)
    }
}

/// Receives formatted log messages.
pub trait LogSink: Send + Sync {
    fn write(&self, message: &str, category: LogCategory, level: Level);
}

impl<F> LogSink for F
where
    F: Fn(&str, LogCategory, Level) + Send + Sync,
{
    fn write(&self, message: &str, category: LogCategory, level: Level) {
        self(message, category, level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// Forward messages emitted by the FMU
    pub fmu_logging: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            fmu_logging: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: LevelFilter, fmu_logging: bool) -> Self {
        Self { level, fmu_logging }
    }

    /// Log specification string, as understood by `flexi_logger` and `env_logger`.
    ///
    /// Carries the level only. Backends configured this way receive FMU messages whenever the
    /// model was instantiated with logging on, see `SimulationSettings::fmu_logging`.
    pub fn spec(&self) -> String {
        self.level.to_string().to_lowercase()
    }
}

impl From<LevelFilter> for LogConfig {
    fn from(level: LevelFilter) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }
}

/// A [`Log`] implementation forwarding to a [`LogSink`].
pub struct SinkLogger<S> {
    sink: S,
    config: LogConfig,
}

impl<S: LogSink> SinkLogger<S> {
    pub fn new(sink: S, config: LogConfig) -> Self {
        Self { sink, config }
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }
}

impl<S: LogSink + 'static> SinkLogger<S> {
    /// Install as the global logger.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let level = self.config.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl<S: LogSink> Log for SinkLogger<S> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.config.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let category = LogCategory::of(record);
        if category == LogCategory::Fmu && !self.config.fmu_logging {
            return;
        }
        let message = if category == LogCategory::Fmu {
            format!("{}: {}", record.target(), record.args())
        } else {
            record.args().to_string()
        };
        self.sink.write(&message, category, record.level());
    }

    fn flush(&self) {}
}
