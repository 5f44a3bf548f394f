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

//! Option chain valuation model for the `optvol` workspace.
//!
//! The crate is organized bottom-up:
//!
//! - [`enums`]: option kind, price source and convergence status.
//! - [`pricing`]: Black-Scholes-Merton pricing and the Newton-Raphson implied volatility solver.
//! - [`chain`]: option quotes, chains, and the liquidity filter applied before valuation.
//! - [`config`]: engine settings loaded from JSON.
//! - [`valuation`]: implied volatility and fair value across a whole chain.
//!
//! # Units
//!
//! Rates, dividend yields and volatilities are annualized decimals (`0.05` is 5%). Times are in
//! years, computed on an Actual/365 basis from quote timestamps.

pub mod chain;
pub mod config;
pub mod enums;
pub mod pricing;
pub mod valuation;

// Re-exports
pub use chain::{ChainFilter, OptionChain, OptionQuote};
pub use config::EngineConfig;
pub use enums::{ConvergenceStatus, OptionKind, PriceSource};
pub use valuation::{OptionValuation, price_chain, value_chain, value_quote};
