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

//! The logging framework for `optvol`.
//!
//! Library code logs through the [`log`] facade (`log::debug!`, `log::warn!`, ...). Binaries
//! and tests that want output call [`init_logging`], which installs a [`Logger`] writing from
//! a dedicated `logging` thread. The returned [`LogGuard`] must be held for as long as logs
//! should be written; dropping the last guard drains pending lines and joins the thread.
//!
//! At most 255 guards may be active at once.

pub mod config;
pub mod logger;
pub mod writer;

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

pub use self::{
    config::LoggerConfig,
    logger::{LogGuard, Logger},
};

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);
static LOGGING_BYPASSED: AtomicBool = AtomicBool::new(false);
static LOGGING_GUARDS_ACTIVE: AtomicU8 = AtomicU8::new(0);

/// Returns whether the core logger is enabled.
#[must_use]
pub fn logging_is_initialized() -> bool {
    LOGGING_INITIALIZED.load(Ordering::Relaxed)
}

/// Initializes logging with the given configuration.
///
/// # Errors
///
/// Returns an error if another `log` implementation is already installed or the logging thread
/// cannot be spawned.
pub fn init_logging(config: LoggerConfig) -> anyhow::Result<LogGuard> {
    Logger::init_with_config(config)
}

/// Initializes logging from the `OPTVOL_LOG` environment variable, falling back to the
/// default configuration when it is unset.
///
/// # Errors
///
/// Returns an error if the variable is set but invalid, or initialization fails.
pub fn init_logging_from_env() -> anyhow::Result<LogGuard> {
    let config = match std::env::var(config::LOG_ENV_VAR) {
        Ok(spec) => LoggerConfig::from_spec(&spec)?,
        Err(_) => LoggerConfig::default(),
    };
    init_logging(config)
}
