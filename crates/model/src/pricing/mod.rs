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

//! Option pricing and implied volatility.
//!
//! - [`black_scholes`]: closed-form Black-Scholes-Merton prices and greeks with a continuous
//!   dividend yield.
//! - [`implied_vol`]: Newton-Raphson implied volatility, plus a reference solver backed by the
//!   `implied-vol` crate.

pub mod black_scholes;
pub mod implied_vol;

// Re-exports
pub use black_scholes::{
    BlackScholesGreeks, PricingRequest, black_scholes_greeks, black_scholes_price,
    black_scholes_vega, price_and_vega,
};
pub use implied_vol::{
    ImpliedVolError, ImpliedVolRequest, ImpliedVolRequestBuilder, ImpliedVolResult,
    implied_vol_newton, reference_implied_vol, solve, solve_detailed,
};
