// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

use std::{
    fmt::Display,
    sync::{Mutex, OnceLock, atomic::Ordering, mpsc::SendError},
};

use chrono::{DateTime, SecondsFormat, Utc};
use log::{Level, LevelFilter, Log, set_boxed_logger, set_max_level};
use ustr::Ustr;

pub use super::config::LoggerConfig;
use super::{LOGGING_BYPASSED, LOGGING_GUARDS_ACTIVE, LOGGING_INITIALIZED};
use crate::logging::writer::{LogWriter, StderrWriter, StdoutWriter};

const LOGGING: &str = "logging";

/// Global log sender which allows multiple log guards per process.
static LOGGER_TX: OnceLock<std::sync::mpsc::Sender<LogEvent>> = OnceLock::new();

/// Global handle to the logging thread - only one thread exists per process.
static LOGGER_HANDLE: Mutex<Option<std::thread::JoinHandle<()>>> = Mutex::new(None);

/// A logger which hands records to a dedicated thread over an MPSC channel.
///
/// Records are formatted and written by the `logging` thread, so the calling thread (for
/// example a solver running over a large option chain) only pays for the channel send.
#[derive(Debug)]
pub struct Logger {
    /// Configuration for logging levels and behavior.
    pub config: LoggerConfig,
    /// Module filters sorted by descending path length.
    module_filters: Vec<(Ustr, LevelFilter)>,
    /// Transmitter for sending log events to the 'logging' thread.
    tx: std::sync::mpsc::Sender<LogEvent>,
}

/// Represents a type of log event.
#[derive(Debug)]
pub enum LogEvent {
    /// A log line event.
    Log(LogLine),
    /// A command to flush all logger buffers.
    Flush,
    /// A command to close the logger.
    Close,
}

/// Represents a log event which includes a message.
#[derive(Clone, Debug)]
pub struct LogLine {
    /// The timestamp for the event.
    pub timestamp: DateTime<Utc>,
    /// The log level for the event.
    pub level: Level,
    /// The module path (or explicit target) the event originated from.
    pub target: Ustr,
    /// The log message content.
    pub message: String,
}

impl LogLine {
    /// Returns the plain log line, newline terminated.
    #[must_use]
    pub fn to_plain_string(&self) -> String {
        format!(
            "{} [{}] {}: {}\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.level,
            self.target,
            self.message,
        )
    }

    /// Returns the log line with ANSI color codes, newline terminated.
    #[must_use]
    pub fn to_colored_string(&self) -> String {
        format!(
            "\x1b[1m{}\x1b[0m {}[{}] {}: {}\x1b[0m\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            level_ansi(self.level),
            self.level,
            self.target,
            self.message,
        )
    }
}

impl Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.target, self.message)
    }
}

const fn level_ansi(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[1;31m",
        Level::Warn => "\x1b[1;33m",
        Level::Info => "\x1b[0m",
        Level::Debug => "\x1b[92m",
        Level::Trace => "\x1b[94m",
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        !LOGGING_BYPASSED.load(Ordering::Relaxed)
            && !should_filter_log(
                metadata.target(),
                metadata.level(),
                &self.module_filters,
                self.config.stdout_level,
            )
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let line = LogLine {
                timestamp: Utc::now(),
                level: record.level(),
                target: Ustr::from(record.target()),
                message: format!("{}", record.args()),
            };
            if let Err(SendError(LogEvent::Log(line))) = self.tx.send(LogEvent::Log(line)) {
                eprintln!("Error sending log event (receiver closed): {line}");
            }
        }
    }

    fn flush(&self) {
        if LOGGING_BYPASSED.load(Ordering::Relaxed) {
            return;
        }

        if let Err(e) = self.tx.send(LogEvent::Flush) {
            eprintln!("Error sending flush log event: {e}");
        }
    }
}

impl Logger {
    /// Initializes the logger based on the `OPTVOL_LOG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the environment variable or parsing the configuration fails.
    pub fn init_with_env() -> anyhow::Result<LogGuard> {
        let config = LoggerConfig::from_env()?;
        Self::init_with_config(config)
    }

    /// Initializes the logger with the given configuration.
    ///
    /// If logging is already initialized an additional [`LogGuard`] is returned and `config`
    /// is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the logger fails to register or initialize the background thread.
    pub fn init_with_config(config: LoggerConfig) -> anyhow::Result<LogGuard> {
        if LOGGING_INITIALIZED.load(Ordering::SeqCst) {
            return LogGuard::new()
                .ok_or_else(|| anyhow::anyhow!("Logging already initialized but sender missing"));
        }

        let (tx, rx) = std::sync::mpsc::channel::<LogEvent>();

        let mut module_filters: Vec<(Ustr, LevelFilter)> = config
            .module_level
            .iter()
            .map(|(path, level)| (*path, *level))
            .collect();
        module_filters.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let max_level = config.max_level();
        let logger = Self {
            config: config.clone(),
            module_filters,
            tx: tx.clone(),
        };

        set_boxed_logger(Box::new(logger))?;

        if LOGGER_TX.set(tx).is_err() {
            anyhow::bail!("Logger sender already set, re-initialization is not supported");
        }

        if config.print_config {
            println!("Logger initialized with {config:?}");
        }

        let handle = std::thread::Builder::new()
            .name(LOGGING.to_string())
            .spawn(move || Self::handle_messages(&config, &rx))?;

        if let Ok(mut handle_guard) = LOGGER_HANDLE.lock() {
            *handle_guard = Some(handle);
        }

        set_max_level(max_level);
        LOGGING_INITIALIZED.store(true, Ordering::SeqCst);

        LogGuard::new()
            .ok_or_else(|| anyhow::anyhow!("Failed to create LogGuard from global sender"))
    }

    fn handle_messages(config: &LoggerConfig, rx: &std::sync::mpsc::Receiver<LogEvent>) {
        let mut stdout_writer = StdoutWriter::new(config.max_level(), config.is_colored);
        let mut stderr_writer = StderrWriter::new(config.is_colored);

        let mut process_line = |line: &LogLine| {
            let formatted = if config.is_colored {
                line.to_colored_string()
            } else {
                line.to_plain_string()
            };

            if stderr_writer.enabled(line) {
                stderr_writer.write(&formatted);
            }
            if stdout_writer.enabled(line) {
                stdout_writer.write(&formatted);
            }
        };

        while let Ok(event) = rx.recv() {
            match event {
                LogEvent::Log(line) => process_line(&line),
                LogEvent::Flush => {
                    io_flush();
                }
                LogEvent::Close => {
                    // Drain events that raced with shutdown
                    while let Ok(evt) = rx.try_recv() {
                        if let LogEvent::Log(line) = evt {
                            process_line(&line);
                        }
                    }
                    io_flush();
                    break;
                }
            }
        }
    }
}

fn io_flush() {
    StdoutWriter::new(LevelFilter::Off, false).flush();
    StderrWriter::new(false).flush();
}

/// Determines if a log record should be filtered out.
///
/// Returns `true` if the record should be skipped. The `module_filters_sorted` slice must be
/// sorted by descending path length so the first `starts_with` match is the longest prefix.
/// Errors are never filtered.
#[must_use]
pub fn should_filter_log(
    target: &str,
    level: Level,
    module_filters_sorted: &[(Ustr, LevelFilter)],
    stdout_level: LevelFilter,
) -> bool {
    if level == Level::Error {
        return false;
    }

    let filter_level = module_filters_sorted
        .iter()
        .find(|(path, _)| target.starts_with(path.as_str()))
        .map_or(stdout_level, |(_, level)| *level);

    level > filter_level
}

/// Keeps the logging thread alive; dropping the last guard flushes and joins it.
#[derive(Debug)]
pub struct LogGuard {
    tx: std::sync::mpsc::Sender<LogEvent>,
}

impl LogGuard {
    /// Creates a new [`LogGuard`] instance from the global logger.
    ///
    /// Returns `None` if logging has not been initialized or 255 guards are already active.
    #[must_use]
    pub fn new() -> Option<Self> {
        let tx = LOGGER_TX.get()?;
        LOGGING_GUARDS_ACTIVE
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_add(1)
            })
            .ok()?;

        Some(Self { tx: tx.clone() })
    }
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        let previous_count = LOGGING_GUARDS_ACTIVE
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_sub(1)
            })
            .unwrap_or(0);

        if previous_count == 1 && LOGGING_GUARDS_ACTIVE.load(Ordering::SeqCst) == 0 {
            LOGGING_BYPASSED.store(true, Ordering::SeqCst);
            log::set_max_level(LevelFilter::Off);

            let _ = self.tx.send(LogEvent::Close);

            if let Ok(mut handle_guard) = LOGGER_HANDLE.lock()
                && let Some(handle) = handle_guard.take()
                && handle.thread().id() != std::thread::current().id()
            {
                let _ = handle.join();
            }

            LOGGING_INITIALIZED.store(false, Ordering::SeqCst);
        } else {
            let _ = self.tx.send(LogEvent::Flush);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn log_line() -> LogLine {
        LogLine {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 20, 14, 30, 0).unwrap(),
            level: Level::Debug,
            target: Ustr::from("optvol_model::pricing::implied_vol"),
            message: "iter 0: sigma=0.3, residual=4.1e-1".to_string(),
        }
    }

    fn sorted(filters: &[(&str, LevelFilter)]) -> Vec<(Ustr, LevelFilter)> {
        let mut filters: Vec<(Ustr, LevelFilter)> = filters
            .iter()
            .map(|(path, level)| (Ustr::from(path), *level))
            .collect();
        filters.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        filters
    }

    #[rstest]
    fn test_log_line_display(log_line: LogLine) {
        assert_eq!(
            log_line.to_string(),
            "[DEBUG] optvol_model::pricing::implied_vol: iter 0: sigma=0.3, residual=4.1e-1"
        );
    }

    #[rstest]
    fn test_log_line_plain_string(log_line: LogLine) {
        assert_eq!(
            log_line.to_plain_string(),
            "2025-06-20T14:30:00.000000000Z [DEBUG] optvol_model::pricing::implied_vol: iter 0: sigma=0.3, residual=4.1e-1\n"
        );
    }

    #[rstest]
    fn test_log_line_colored_string(log_line: LogLine) {
        let colored = log_line.to_colored_string();
        assert!(colored.starts_with("\x1b[1m2025-06-20T14:30:00.000000000Z\x1b[0m \x1b[92m"));
        assert!(colored.ends_with("\x1b[0m\n"));
    }

    #[rstest]
    fn test_filter_without_module_filters_uses_stdout_level() {
        assert!(!should_filter_log("a", Level::Info, &[], LevelFilter::Info));
        assert!(should_filter_log("a", Level::Debug, &[], LevelFilter::Info));
    }

    #[rstest]
    fn test_filter_never_drops_errors() {
        assert!(!should_filter_log("a", Level::Error, &[], LevelFilter::Off));
    }

    #[rstest]
    fn test_filter_longest_prefix_wins() {
        let filters = sorted(&[
            ("optvol_model", LevelFilter::Warn),
            ("optvol_model::pricing", LevelFilter::Trace),
        ]);
        assert!(!should_filter_log(
            "optvol_model::pricing::implied_vol",
            Level::Trace,
            &filters,
            LevelFilter::Info,
        ));
        assert!(should_filter_log(
            "optvol_model::valuation",
            Level::Info,
            &filters,
            LevelFilter::Info,
        ));
    }

    #[rstest]
    fn test_filter_module_can_raise_verbosity_above_stdout() {
        let filters = sorted(&[("optvol_model::pricing", LevelFilter::Debug)]);
        assert!(!should_filter_log(
            "optvol_model::pricing::implied_vol",
            Level::Debug,
            &filters,
            LevelFilter::Warn,
        ));
    }
}
