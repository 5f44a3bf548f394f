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

//! Time conversions used to annualize option expiries.
//!
//! All year fractions use the Actual/365 convention: elapsed seconds divided by
//! `365 * 24 * 3600`. Leap days are not treated specially.

use chrono::{DateTime, Utc};

/// Number of seconds in one day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of days in one year (Actual/365).
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Number of seconds in one year (Actual/365).
pub const SECONDS_PER_YEAR: f64 = DAYS_PER_YEAR * 24.0 * 3600.0;

const NANOSECONDS_IN_SECOND: f64 = 1_000_000_000.0;

/// Returns the Actual/365 year fraction between `start` and `end`.
///
/// The result is negative when `end` precedes `start`.
#[must_use]
pub fn year_fraction(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end.signed_duration_since(start);
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / NANOSECONDS_IN_SECOND / SECONDS_PER_YEAR,
        // Beyond ~292 years the nanosecond count overflows i64
        None => delta.num_seconds() as f64 / SECONDS_PER_YEAR,
    }
}

/// Converts a number of calendar days into years (Actual/365).
#[must_use]
pub fn days_to_years(days: f64) -> f64 {
    days / DAYS_PER_YEAR
}
