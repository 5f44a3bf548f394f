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

//! Option quotes and chains as delivered by an upstream market data loader.
//!
//! Retrieval is out of scope; a chain arrives either as values or as JSON. The liquidity filter
//! mirrors the cleaning step applied upstream: quotes with a dust-level mid or an expiry inside
//! one day are dropped before valuation.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use optvol_core::{
    correctness::{FAILED, check_non_negative_f64},
    datetime::{days_to_years, year_fraction},
};
use serde::{Deserialize, Serialize};

use crate::enums::{OptionKind, PriceSource};

/// Minimum mid price for a quote to be retained.
pub const DEFAULT_MIN_MID: f64 = 0.05;

/// A single option quote with the spot observed at the same instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub spot: f64,
    pub strike: f64,
    pub kind: OptionKind,
    pub expiry: DateTime<Utc>,
    pub bid: f64,
    pub ask: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_price: Option<f64>,
    /// When the quote was observed.
    pub asof: DateTime<Utc>,
}

impl OptionQuote {
    #[must_use]
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    #[must_use]
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// Returns `K / S`.
    #[must_use]
    pub fn moneyness(&self) -> f64 {
        self.strike / self.spot
    }

    /// Returns the Actual/365 year fraction from `asof` to `expiry`.
    #[must_use]
    pub fn time_to_expiry(&self) -> f64 {
        year_fraction(self.asof, self.expiry)
    }

    /// Returns the price to treat as the market price for the given source.
    ///
    /// [`PriceSource::Last`] yields `None` when no last trade is recorded.
    #[must_use]
    pub fn market_price(&self, source: PriceSource) -> Option<f64> {
        match source {
            PriceSource::Bid => Some(self.bid),
            PriceSource::Ask => Some(self.ask),
            PriceSource::Mid => Some(self.mid()),
            PriceSource::Last => self.last_price,
        }
    }
}

impl Display for OptionQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} K={} exp={} bid={} ask={}",
            self.kind,
            self.strike,
            self.expiry.format("%Y-%m-%d"),
            self.bid,
            self.ask,
        )
    }
}

/// Liquidity filter applied before valuation. Both bounds are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainFilter {
    pub min_mid: f64,
    /// Minimum time to expiry in years.
    pub min_time_to_expiry: f64,
}

impl Default for ChainFilter {
    fn default() -> Self {
        Self {
            min_mid: DEFAULT_MIN_MID,
            min_time_to_expiry: days_to_years(1.0),
        }
    }
}

impl ChainFilter {
    /// Creates a new [`ChainFilter`] instance with correctness checking.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is negative or not finite.
    pub fn new_checked(min_mid: f64, min_time_to_expiry: f64) -> anyhow::Result<Self> {
        check_non_negative_f64(min_mid, stringify!(min_mid))?;
        check_non_negative_f64(min_time_to_expiry, stringify!(min_time_to_expiry))?;
        Ok(Self {
            min_mid,
            min_time_to_expiry,
        })
    }

    /// Creates a new [`ChainFilter`] instance.
    ///
    /// # Panics
    ///
    /// Panics if either bound is negative or not finite.
    #[must_use]
    pub fn new(min_mid: f64, min_time_to_expiry: f64) -> Self {
        Self::new_checked(min_mid, min_time_to_expiry).expect(FAILED)
    }

    #[must_use]
    pub fn retains(&self, quote: &OptionQuote) -> bool {
        quote.mid() > self.min_mid && quote.time_to_expiry() > self.min_time_to_expiry
    }
}

/// All quotes for one underlying observed at one instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub underlying: String,
    pub spot: f64,
    pub asof: DateTime<Utc>,
    #[serde(default)]
    pub quotes: Vec<OptionQuote>,
}

impl OptionChain {
    #[must_use]
    pub fn new(
        underlying: impl Into<String>,
        spot: f64,
        asof: DateTime<Utc>,
        quotes: Vec<OptionQuote>,
    ) -> Self {
        Self {
            underlying: underlying.into(),
            spot,
            asof,
            quotes,
        }
    }

    /// Parses a chain from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or does not describe a chain.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the chain to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn calls(&self) -> impl Iterator<Item = &OptionQuote> {
        self.quotes.iter().filter(|q| q.kind == OptionKind::Call)
    }

    pub fn puts(&self) -> impl Iterator<Item = &OptionQuote> {
        self.quotes.iter().filter(|q| q.kind == OptionKind::Put)
    }

    /// Returns the distinct expiries in ascending order.
    #[must_use]
    pub fn expiries(&self) -> Vec<DateTime<Utc>> {
        let mut expiries: Vec<_> = self.quotes.iter().map(|q| q.expiry).collect();
        expiries.sort_unstable();
        expiries.dedup();
        expiries
    }

    /// Returns a copy of the chain keeping only the quotes the filter retains.
    #[must_use]
    pub fn clean(&self, filter: &ChainFilter) -> Self {
        let quotes: Vec<_> = self
            .quotes
            .iter()
            .filter(|q| filter.retains(q))
            .cloned()
            .collect();

        log::debug!(
            "Cleaned {} chain: kept {} of {} quotes",
            self.underlying,
            quotes.len(),
            self.quotes.len()
        );

        Self {
            underlying: self.underlying.clone(),
            spot: self.spot,
            asof: self.asof,
            quotes,
        }
    }
}
