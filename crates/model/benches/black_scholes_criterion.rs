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

use std::hint::black_box;

use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group};
use optvol_model::{
    chain::{OptionChain, OptionQuote},
    config::EngineConfig,
    enums::OptionKind,
    pricing::{
        black_scholes::{PricingRequest, black_scholes_price, price_and_vega},
        implied_vol::{ImpliedVolRequest, reference_implied_vol, solve},
    },
    valuation::value_chain,
};

const RATE: f64 = 0.05;
const DIVIDEND_YIELD: f64 = 0.01;
const VOL: f64 = 0.2;
const STRIKE: f64 = 100.0;
const EXPIRY: f64 = 1.0;

const SCENARIOS: [(f64, &str); 3] = [(90.0, "otm"), (100.0, "atm"), (110.0, "itm")];
const KINDS: [(OptionKind, &str); 2] = [(OptionKind::Call, "call"), (OptionKind::Put, "put")];

fn pricing_request(spot: f64, kind: OptionKind) -> PricingRequest {
    PricingRequest::new(spot, STRIKE, EXPIRY, RATE, VOL, kind).with_dividend_yield(DIVIDEND_YIELD)
}

fn bench_price_and_vega(c: &mut Criterion) {
    let mut group = c.benchmark_group("price_and_vega");
    for (spot, moneyness_label) in SCENARIOS {
        for (kind, kind_label) in KINDS {
            let req = pricing_request(spot, kind);
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{moneyness_label}_{kind_label}")),
                &req,
                |b, req| b.iter(|| black_box(price_and_vega(black_box(req)))),
            );
        }
    }
    group.finish();
}

fn bench_newton_implied_vol(c: &mut Criterion) {
    let mut group = c.benchmark_group("newton_implied_vol");
    for (spot, moneyness_label) in SCENARIOS {
        for (kind, kind_label) in KINDS {
            let market_price = black_scholes_price(&pricing_request(spot, kind));
            let req = ImpliedVolRequest {
                dividend_yield: DIVIDEND_YIELD,
                ..ImpliedVolRequest::new(spot, STRIKE, EXPIRY, RATE, market_price, kind)
            };
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{moneyness_label}_{kind_label}")),
                &req,
                |b, req| b.iter(|| black_box(solve(black_box(req)))),
            );
        }
    }
    group.finish();
}

fn bench_reference_implied_vol(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_implied_vol");
    for (spot, moneyness_label) in SCENARIOS {
        for (kind, kind_label) in KINDS {
            let market_price = black_scholes_price(&pricing_request(spot, kind));
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{moneyness_label}_{kind_label}")),
                &(spot, kind, market_price),
                |b, &(s, kind, price)| {
                    b.iter(|| {
                        black_box(reference_implied_vol(
                            black_box(s),
                            black_box(STRIKE),
                            black_box(EXPIRY),
                            black_box(RATE),
                            black_box(DIVIDEND_YIELD),
                            black_box(kind),
                            black_box(price),
                        ))
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_value_chain(c: &mut Criterion) {
    let asof = Utc.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).unwrap();
    let expiry = Utc.with_ymd_and_hms(2024, 12, 20, 16, 0, 0).unwrap();
    let config = EngineConfig {
        rate: RATE,
        dividend_yield: DIVIDEND_YIELD,
        ..EngineConfig::default()
    };

    let quotes = (0..200)
        .map(|i| {
            let strike = 50.0 + f64::from(i) * 0.5;
            let kind = if strike < 100.0 {
                OptionKind::Put
            } else {
                OptionKind::Call
            };
            let price = black_scholes_price(
                &PricingRequest::new(100.0, strike, 0.96, RATE, VOL, kind)
                    .with_dividend_yield(DIVIDEND_YIELD),
            );
            OptionQuote {
                spot: 100.0,
                strike,
                kind,
                expiry,
                bid: price * 0.99,
                ask: price * 1.01,
                last_price: None,
                asof,
            }
        })
        .collect();
    let chain = OptionChain::new("SPY", 100.0, asof, quotes);

    let mut group = c.benchmark_group("value_chain");
    for parallel in [false, true] {
        let config = EngineConfig {
            parallel,
            ..config.clone()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(if parallel { "parallel" } else { "sequential" }),
            &config,
            |b, config| b.iter(|| black_box(value_chain(black_box(&chain), config))),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_price_and_vega,
    bench_newton_implied_vol,
    bench_reference_implied_vol,
    bench_value_chain,
);
criterion::criterion_main!(benches);
