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

use std::io::{self, Stderr, Stdout, Write};

use log::{Level, LevelFilter};

use crate::logging::logger::LogLine;

pub trait LogWriter {
    /// Writes a log line.
    fn write(&mut self, line: &str);
    /// Flushes buffered logs.
    fn flush(&mut self);
    /// Checks if a line needs to be written to the writer or not.
    fn enabled(&self, line: &LogLine) -> bool;
}

#[derive(Debug)]
pub struct StdoutWriter {
    pub is_colored: bool,
    io: Stdout,
    level: LevelFilter,
}

impl StdoutWriter {
    /// Creates a new [`StdoutWriter`] instance.
    #[must_use]
    pub fn new(level: LevelFilter, is_colored: bool) -> Self {
        Self {
            io: io::stdout(),
            level,
            is_colored,
        }
    }
}

impl LogWriter for StdoutWriter {
    fn write(&mut self, line: &str) {
        if let Err(e) = self.io.write_all(line.as_bytes()) {
            eprintln!("Error writing to stdout: {e:?}");
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.io.flush() {
            eprintln!("Error flushing stdout: {e:?}");
        }
    }

    fn enabled(&self, line: &LogLine) -> bool {
        // Errors go to stderr only
        line.level > Level::Error && line.level <= self.level
    }
}

#[derive(Debug)]
pub struct StderrWriter {
    pub is_colored: bool,
    io: Stderr,
}

impl StderrWriter {
    /// Creates a new [`StderrWriter`] instance.
    #[must_use]
    pub fn new(is_colored: bool) -> Self {
        Self {
            io: io::stderr(),
            is_colored,
        }
    }
}

impl LogWriter for StderrWriter {
    fn write(&mut self, line: &str) {
        if let Err(e) = self.io.write_all(line.as_bytes()) {
            eprintln!("Error writing to stderr: {e:?}");
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.io.flush() {
            eprintln!("Error flushing stderr: {e:?}");
        }
    }

    fn enabled(&self, line: &LogLine) -> bool {
        line.level == Level::Error
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;
    use ustr::Ustr;

    use super::*;

    fn line(level: Level) -> LogLine {
        LogLine {
            timestamp: Utc::now(),
            level,
            target: Ustr::from("optvol_model::pricing"),
            message: "sigma=0.2".to_string(),
        }
    }

    #[rstest]
    #[case(Level::Error, false)]
    #[case(Level::Warn, true)]
    #[case(Level::Info, true)]
    #[case(Level::Debug, false)]
    fn test_stdout_writer_enabled(#[case] level: Level, #[case] expected: bool) {
        let writer = StdoutWriter::new(LevelFilter::Info, false);
        assert_eq!(writer.enabled(&line(level)), expected);
    }

    #[rstest]
    #[case(Level::Error, true)]
    #[case(Level::Warn, false)]
    #[case(Level::Trace, false)]
    fn test_stderr_writer_enabled(#[case] level: Level, #[case] expected: bool) {
        let writer = StderrWriter::new(false);
        assert_eq!(writer.enabled(&line(level)), expected);
    }
}
