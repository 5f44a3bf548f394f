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

//! Implied volatility and fair value across an option chain.
//!
//! Every row is independent, so a chain is valued on the rayon thread pool when
//! [`EngineConfig::parallel`] is set. Output rows are always in input order.

use std::borrow::Cow;

use rayon::prelude::*;

use crate::{
    chain::{OptionChain, OptionQuote},
    config::EngineConfig,
    enums::ConvergenceStatus,
    pricing::{
        black_scholes::{PricingRequest, black_scholes_price},
        implied_vol::{
            ImpliedVolError, ImpliedVolRequest, ImpliedVolResult, reference_implied_vol,
            solve_detailed,
        },
    },
};

/// The valuation of a single quote.
#[derive(Clone, Debug, PartialEq)]
pub struct OptionValuation {
    pub quote: OptionQuote,
    pub time_to_expiry: f64,
    /// The price the solver was asked to match, if the quote carried one.
    pub market_price: Option<f64>,
    pub implied_vol: Result<ImpliedVolResult, ImpliedVolError>,
    /// Black-Scholes price at the solved volatility.
    pub fair_value: Option<f64>,
}

impl OptionValuation {
    #[must_use]
    pub fn vol(&self) -> Option<f64> {
        self.implied_vol.as_ref().ok().map(|result| result.vol)
    }

    #[must_use]
    pub fn status(&self) -> Option<ConvergenceStatus> {
        self.implied_vol.as_ref().ok().map(|result| result.status)
    }
}

fn implied_vol_request(
    quote: &OptionQuote,
    time_to_expiry: f64,
    market_price: f64,
    config: &EngineConfig,
) -> ImpliedVolRequest {
    ImpliedVolRequest {
        spot: quote.spot,
        strike: quote.strike,
        time_to_expiry,
        rate: config.rate,
        market_price,
        kind: quote.kind,
        dividend_yield: config.dividend_yield,
        initial_guess: config.initial_guess,
        tolerance: config.tolerance,
        max_iter: config.max_iter,
        max_step: config.max_step,
        verbose: config.verbose,
    }
}

fn solve_with_retry(
    req: &ImpliedVolRequest,
    config: &EngineConfig,
) -> Result<ImpliedVolResult, ImpliedVolError> {
    let result = solve_detailed(req);

    if !config.retry_with_reference {
        return result;
    }

    if let Err(ImpliedVolError::NonFiniteResidual { .. }) = result
        && let Some(seed) = reference_implied_vol(
            req.spot,
            req.strike,
            req.time_to_expiry,
            req.rate,
            req.dividend_yield,
            req.kind,
            req.market_price,
        )
    {
        log::debug!(
            "Retrying K={} {} from reference seed vol={seed}",
            req.strike,
            req.kind
        );
        return solve_detailed(&ImpliedVolRequest {
            initial_guess: seed,
            ..req.clone()
        });
    }

    result
}

/// Values a single quote: solves for implied volatility and reprices at the solved vol.
///
/// A quote without a price for the configured source yields
/// [`ImpliedVolError::InvalidInput`].
#[must_use]
pub fn value_quote(quote: &OptionQuote, config: &EngineConfig) -> OptionValuation {
    let time_to_expiry = quote.time_to_expiry();
    let market_price = quote.market_price(config.price_source);

    let implied_vol = match market_price {
        Some(price) => {
            let req = implied_vol_request(quote, time_to_expiry, price, config);
            solve_with_retry(&req, config)
        }
        None => Err(ImpliedVolError::InvalidInput(format!(
            "No {} price for {quote}",
            config.price_source
        ))),
    };

    match &implied_vol {
        Ok(result) if result.status == ConvergenceStatus::Exhausted => log::warn!(
            "No convergence for {quote} after {} iterations: vol={}, residual={}",
            result.iterations,
            result.vol,
            result.residual
        ),
        Err(e @ ImpliedVolError::NonFiniteResidual { .. }) => log::error!("{quote}: {e}"),
        _ => {}
    }

    let fair_value = implied_vol.as_ref().ok().map(|result| {
        black_scholes_price(
            &PricingRequest::new(
                quote.spot,
                quote.strike,
                time_to_expiry,
                config.rate,
                result.vol,
                quote.kind,
            )
            .with_dividend_yield(config.dividend_yield),
        )
    });

    OptionValuation {
        quote: quote.clone(),
        time_to_expiry,
        market_price,
        implied_vol,
        fair_value,
    }
}

/// Values every quote in the chain, cleaning it first when [`EngineConfig::clean`] is set.
#[must_use]
pub fn value_chain(chain: &OptionChain, config: &EngineConfig) -> Vec<OptionValuation> {
    let chain = if config.clean {
        Cow::Owned(chain.clean(&config.filter))
    } else {
        Cow::Borrowed(chain)
    };

    let valuations: Vec<OptionValuation> = if config.parallel {
        chain
            .quotes
            .par_iter()
            .map(|quote| value_quote(quote, config))
            .collect()
    } else {
        chain
            .quotes
            .iter()
            .map(|quote| value_quote(quote, config))
            .collect()
    };

    log_summary(&chain.underlying, &valuations);
    valuations
}

fn log_summary(underlying: &str, valuations: &[OptionValuation]) {
    let mut converged = 0;
    let mut exhausted = 0;
    let mut failed = 0;
    for valuation in valuations {
        match valuation.status() {
            Some(ConvergenceStatus::Converged) => converged += 1,
            Some(ConvergenceStatus::Exhausted) => exhausted += 1,
            None => failed += 1,
        }
    }

    log::info!(
        "Valued {underlying} chain: {} quotes, converged={converged}, exhausted={exhausted}, failed={failed}",
        valuations.len()
    );
}

/// Returns the Black-Scholes price of every quote in the chain at a flat volatility.
#[must_use]
pub fn price_chain(chain: &OptionChain, vol: f64, config: &EngineConfig) -> Vec<f64> {
    let price = |quote: &OptionQuote| {
        black_scholes_price(
            &PricingRequest::new(
                quote.spot,
                quote.strike,
                quote.time_to_expiry(),
                config.rate,
                vol,
                quote.kind,
            )
            .with_dividend_yield(config.dividend_yield),
        )
    };

    if config.parallel {
        chain.quotes.par_iter().map(price).collect()
    } else {
        chain.quotes.iter().map(price).collect()
    }
}
