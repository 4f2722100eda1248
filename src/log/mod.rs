//! Diagnostic logging for the simulator. This is distinct from _reporting_ (`crate::report`),
//! which records model output.
//!
//! Every module logs through the `log` facade macros (`error!`, `warn!`, `info!`, `debug!`,
//! `trace!`). Logging is _disabled_ by default; the binary enables it with
//! `--log-level <level>`, and code can control it with:
//!
//!  - `enable_logging()` / `disable_logging()`
//!  - `set_log_level(level)`: only messages with priority at least `level` are emitted
//!  - `set_module_filter()` / `set_module_filters()` / `remove_module_filter()`
//!
//! ```rust
//! use malaria_abm::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! set_log_level(LevelFilter::Info);
//! // Show individual bites and deaths.
//! set_module_filter("malaria_abm::transmission", LevelFilter::Trace);
//! ```
mod console_logger;
#[cfg(feature = "progress_bar")]
mod progress_bar_encoder;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;

use crate::HashMap;
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;
// Per-bite trace output runs to millions of lines per simulated year.
const DEFAULT_MODULE_FILTERS: [(&str, LevelFilter); 1] =
    [("malaria_abm::transmission", LevelFilter::Debug)];

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// Level filter for one module path (e.g. `"malaria_abm::movement"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// The process-wide logging configuration and the handle of the installed `log4rs` logger.
/// The public API consists of free functions that lock the singleton.
#[derive(Debug)]
struct LogConfiguration {
    global_log_level: LevelFilter,
    module_configurations: HashMap<String, ModuleLogConfiguration>,
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        let module_configurations = DEFAULT_MODULE_FILTERS
            .map(|(module, level)| (module.to_string(), (module, level).into()));
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations: HashMap::from_iter(module_configurations),
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration changed.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().level == level {
                    return false;
                }
                entry.get_mut().level = level;
            }
            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut mutated = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module, *level);
        }
        if mutated {
            self.set_config();
        }
    }

    fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

/// Enables every log message. Equivalent to `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filters(&[(module_path, level_filter)]);
}

/// Sets level filters for several module paths at once.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

/// Removes the filter for a module path so that the global level applies to it.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::{get_log_configuration, remove_module_filter, set_log_level, set_module_filters};
    use log::{error, trace, LevelFilter};
    use std::sync::{LazyLock, Mutex};

    // Logging configuration is global, so these tests run serially.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn set_level() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Error);
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Error);
            error!("set_level: global set to error");
            trace!("set_level: NOT EMITTED");
        }
        set_log_level(LevelFilter::Trace);
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Trace);
        set_log_level(LevelFilter::Off);
    }

    #[test]
    fn set_and_remove_module_filters() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Off);
        {
            let config = get_log_configuration();
            assert_eq!(config.module_configurations.len(), 1);
            assert_eq!(
                config
                    .module_configurations
                    .get("malaria_abm::transmission"),
                Some(&("malaria_abm::transmission", LevelFilter::Debug).into())
            );
        }

        let filters = [
            ("malaria_abm::transmission", LevelFilter::Trace),
            ("malaria_abm::movement", LevelFilter::Info),
        ];
        set_module_filters(&filters);
        {
            let config = get_log_configuration();
            assert_eq!(config.module_configurations.len(), 2);
            for (module_path, level) in filters {
                assert_eq!(
                    config.module_configurations.get(module_path),
                    Some(&(module_path, level).into())
                );
            }
        }

        remove_module_filter("malaria_abm::movement");
        set_module_filters(&[("malaria_abm::transmission", LevelFilter::Debug)]);
        let config = get_log_configuration();
        assert_eq!(config.module_configurations.len(), 1);
    }
}
