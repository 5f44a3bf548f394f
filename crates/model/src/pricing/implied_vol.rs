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

//! Implied volatility by Newton-Raphson on the Black-Scholes price.
//!
//! The residual `f(vol) = price(vol) - market_price` is driven to zero with the update
//! `vol -= f(vol) / vega(vol)`, where vega comes from the same kernel as the price.
//!
//! Termination:
//! - `|f(vol)| < tolerance`: converged.
//! - `f(vol)` is NaN or infinite: [`ImpliedVolError::NonFiniteResidual`].
//! - `max_iter` updates performed: the last estimate is returned without error. Use
//!   [`solve_detailed`] to observe the [`ConvergenceStatus`].
//!
//! The step is unguarded by default. A vanishing vega (deep in or out of the money) produces
//! a huge or infinite step which surfaces as a non-finite residual on a later iteration.
//! Setting [`ImpliedVolRequest::max_step`] clamps `|step|` instead.

use derive_builder::Builder;
use implied_vol::{DefaultSpecialFn, ImpliedBlackVolatility};
use optvol_core::correctness::{
    check_finite_f64, check_non_negative_f64, check_positive_f64, check_positive_usize,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    enums::{ConvergenceStatus, OptionKind},
    pricing::black_scholes::{PricingRequest, price_and_vega},
};

pub const DEFAULT_INITIAL_GUESS: f64 = 0.3;
pub const DEFAULT_TOLERANCE: f64 = 1e-7;
pub const DEFAULT_MAX_ITER: usize = 100;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ImpliedVolError {
    /// The residual became NaN or infinite; iterating further would only propagate garbage.
    #[error("Residual was non-finite at iteration {iteration}: vol={vol}, residual={residual}")]
    NonFiniteResidual {
        iteration: usize,
        vol: f64,
        residual: f64,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Inputs for a single implied volatility search.
///
/// Built with [`ImpliedVolRequestBuilder`]; optional fields default to an initial guess of
/// `0.3`, a tolerance of `1e-7`, `100` iterations, no dividend yield and no step clamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Builder)]
pub struct ImpliedVolRequest {
    pub spot: f64,
    pub strike: f64,
    /// Time to expiry in years.
    pub time_to_expiry: f64,
    pub rate: f64,
    /// The observed option price to match.
    pub market_price: f64,
    pub kind: OptionKind,
    #[builder(default)]
    pub dividend_yield: f64,
    #[builder(default = "DEFAULT_INITIAL_GUESS")]
    pub initial_guess: f64,
    /// Absolute tolerance on the price residual.
    #[builder(default = "DEFAULT_TOLERANCE")]
    pub tolerance: f64,
    #[builder(default = "DEFAULT_MAX_ITER")]
    pub max_iter: usize,
    /// Optional cap on `|step|` per iteration.
    #[builder(default)]
    pub max_step: Option<f64>,
    /// Emit a per-iteration trace at debug level.
    #[builder(default)]
    pub verbose: bool,
}

impl ImpliedVolRequest {
    /// Creates a new [`ImpliedVolRequest`] with default solver settings.
    #[must_use]
    pub const fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        market_price: f64,
        kind: OptionKind,
    ) -> Self {
        Self {
            spot,
            strike,
            time_to_expiry,
            rate,
            market_price,
            kind,
            dividend_yield: 0.0,
            initial_guess: DEFAULT_INITIAL_GUESS,
            tolerance: DEFAULT_TOLERANCE,
            max_iter: DEFAULT_MAX_ITER,
            max_step: None,
            verbose: false,
        }
    }

    #[must_use]
    pub fn builder() -> ImpliedVolRequestBuilder {
        ImpliedVolRequestBuilder::default()
    }

    /// Validates the request. The solver itself never calls this.
    ///
    /// # Errors
    ///
    /// Returns an error if any market input or solver setting is out of range.
    pub fn validate(&self) -> anyhow::Result<()> {
        check_positive_f64(self.spot, stringify!(spot))?;
        check_positive_f64(self.strike, stringify!(strike))?;
        check_positive_f64(self.time_to_expiry, stringify!(time_to_expiry))?;
        check_finite_f64(self.rate, stringify!(rate))?;
        check_non_negative_f64(self.market_price, stringify!(market_price))?;
        check_non_negative_f64(self.dividend_yield, stringify!(dividend_yield))?;
        check_positive_f64(self.initial_guess, stringify!(initial_guess))?;
        check_positive_f64(self.tolerance, stringify!(tolerance))?;
        check_positive_usize(self.max_iter, stringify!(max_iter))?;
        if let Some(max_step) = self.max_step {
            check_positive_f64(max_step, stringify!(max_step))?;
        }
        Ok(())
    }

    /// Returns the pricing request at the given vol.
    #[must_use]
    pub const fn pricing_request(&self, vol: f64) -> PricingRequest {
        PricingRequest {
            spot: self.spot,
            strike: self.strike,
            time_to_expiry: self.time_to_expiry,
            rate: self.rate,
            vol,
            dividend_yield: self.dividend_yield,
            kind: self.kind,
        }
    }
}

/// Outcome of a search which did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolResult {
    /// The volatility estimate.
    pub vol: f64,
    /// Number of Newton updates applied.
    pub iterations: usize,
    /// The most recently evaluated residual (NaN if none was evaluated).
    pub residual: f64,
    pub status: ConvergenceStatus,
}

impl ImpliedVolResult {
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

/// Solves for implied volatility, returning the estimate only.
///
/// Exhausting `max_iter` is not an error; the last estimate is returned.
///
/// # Errors
///
/// Returns [`ImpliedVolError::NonFiniteResidual`] if the residual becomes NaN or infinite.
pub fn solve(req: &ImpliedVolRequest) -> Result<f64, ImpliedVolError> {
    solve_detailed(req).map(|result| result.vol)
}

/// Solves for implied volatility, also reporting how the search terminated.
///
/// # Errors
///
/// Returns [`ImpliedVolError::NonFiniteResidual`] if the residual becomes NaN or infinite.
pub fn solve_detailed(req: &ImpliedVolRequest) -> Result<ImpliedVolResult, ImpliedVolError> {
    let mut vol = req.initial_guess;
    let mut residual = f64::NAN;

    for iteration in 0..req.max_iter {
        let (model_price, vega) = price_and_vega(&req.pricing_request(vol));
        residual = model_price - req.market_price;

        if req.verbose {
            log::debug!("Iter {iteration}: vol={vol}, residual={residual}");
        }

        if residual.abs() < req.tolerance {
            return Ok(ImpliedVolResult {
                vol,
                iterations: iteration,
                residual,
                status: ConvergenceStatus::Converged,
            });
        }

        if !residual.is_finite() {
            return Err(ImpliedVolError::NonFiniteResidual {
                iteration,
                vol,
                residual,
            });
        }

        let mut step = residual / vega;
        if let Some(max_step) = req.max_step
            && step.abs() > max_step
        {
            step = max_step.copysign(step);
        }
        vol -= step;
    }

    if req.verbose {
        log::debug!(
            "No convergence after {} iterations: vol={vol}, residual={residual}",
            req.max_iter
        );
    }

    Ok(ImpliedVolResult {
        vol,
        iterations: req.max_iter,
        residual,
        status: ConvergenceStatus::Exhausted,
    })
}

/// Positional form of [`solve`].
///
/// # Errors
///
/// Returns [`ImpliedVolError::NonFiniteResidual`] if the residual becomes NaN or infinite.
#[allow(clippy::too_many_arguments)]
pub fn implied_vol_newton(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    market_price: f64,
    initial_guess: f64,
    dividend_yield: f64,
    kind: OptionKind,
    tolerance: f64,
    max_iter: usize,
    verbose: bool,
) -> Result<f64, ImpliedVolError> {
    solve(&ImpliedVolRequest {
        spot,
        strike,
        time_to_expiry,
        rate,
        market_price,
        kind,
        dividend_yield,
        initial_guess,
        tolerance,
        max_iter,
        max_step: None,
        verbose,
    })
}

/// Implied volatility from Jäckel's "Let's be rational" algorithm via the `implied-vol` crate.
///
/// The price is converted to forward (undiscounted) terms first. Returns `None` when the price
/// is outside the no-arbitrage bounds or no volatility could be implied.
#[must_use]
pub fn reference_implied_vol(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    dividend_yield: f64,
    kind: OptionKind,
    market_price: f64,
) -> Option<f64> {
    let forward = spot * ((rate - dividend_yield) * time_to_expiry).exp();
    let forward_price = market_price * (rate * time_to_expiry).exp();

    let vol = ImpliedBlackVolatility::builder()
        .option_price(forward_price)
        .forward(forward)
        .strike(strike)
        .expiry(time_to_expiry)
        .is_call(kind.is_call())
        .build_unchecked()
        .calculate::<DefaultSpecialFn>()
        .unwrap_or(f64::NAN);

    (vol.is_finite() && vol > 0.0).then_some(vol)
}
