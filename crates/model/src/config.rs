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

//! Configuration for chain valuation.

use optvol_core::correctness::{
    check_finite_f64, check_non_negative_f64, check_positive_f64, check_positive_usize,
};
use serde::{Deserialize, Serialize};

use crate::{
    chain::ChainFilter,
    enums::PriceSource,
    pricing::implied_vol::{DEFAULT_INITIAL_GUESS, DEFAULT_MAX_ITER, DEFAULT_TOLERANCE},
};

/// Settings shared by every row of a chain valuation.
///
/// Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Flat continuously compounded risk-free rate.
    pub rate: f64,
    /// Continuous dividend yield of the underlying.
    pub dividend_yield: f64,
    /// Which quote field is treated as the market price.
    pub price_source: PriceSource,
    pub initial_guess: f64,
    pub tolerance: f64,
    pub max_iter: usize,
    /// Optional cap on the Newton step; `None` leaves the step unguarded.
    pub max_step: Option<f64>,
    /// Trace every solver iteration at debug level.
    pub verbose: bool,
    /// Apply `filter` to the chain before valuation.
    pub clean: bool,
    pub filter: ChainFilter,
    /// On a non-finite residual, re-solve once seeded from the reference solver.
    pub retry_with_reference: bool,
    /// Value rows on the rayon thread pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate: 0.0,
            dividend_yield: 0.0,
            price_source: PriceSource::default(),
            initial_guess: DEFAULT_INITIAL_GUESS,
            tolerance: DEFAULT_TOLERANCE,
            max_iter: DEFAULT_MAX_ITER,
            max_step: None,
            verbose: false,
            clean: true,
            filter: ChainFilter::default(),
            retry_with_reference: false,
            parallel: true,
        }
    }
}

impl EngineConfig {
    /// Parses a config from JSON and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the config fails [`EngineConfig::validate`].
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the config.
    ///
    /// # Errors
    ///
    /// Returns an error if any setting is out of range.
    pub fn validate(&self) -> anyhow::Result<()> {
        check_finite_f64(self.rate, stringify!(rate))?;
        check_non_negative_f64(self.dividend_yield, stringify!(dividend_yield))?;
        check_positive_f64(self.initial_guess, stringify!(initial_guess))?;
        check_positive_f64(self.tolerance, stringify!(tolerance))?;
        check_positive_usize(self.max_iter, stringify!(max_iter))?;
        if let Some(max_step) = self.max_step {
            check_positive_f64(max_step, stringify!(max_step))?;
        }
        check_non_negative_f64(self.filter.min_mid, "filter.min_mid")?;
        check_non_negative_f64(self.filter.min_time_to_expiry, "filter.min_time_to_expiry")?;
        Ok(())
    }
}
