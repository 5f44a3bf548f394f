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

//! Closed-form Black-Scholes-Merton pricing for European options with a continuous
//! dividend yield.
//!
//! ```text
//! d1   = (ln(S/K) + (r - q + vol^2 / 2) * T) / (vol * sqrt(T))
//! d2   = d1 - vol * sqrt(T)
//! call = S * e^(-qT) * N(d1) - K * e^(-rT) * N(d2)
//! put  = K * e^(-rT) * N(-d2) - S * e^(-qT) * N(-d1)
//! ```
//!
//! The functions here do not guard degenerate inputs: `T = 0` or `vol = 0` divide by zero and
//! may yield NaN. Use [`PricingRequest::new_checked`] to validate inputs up front.

use implied_vol::{DefaultSpecialFn, SpecialFn};
use optvol_core::correctness::{check_finite_f64, check_non_negative_f64, check_positive_f64};
use serde::{Deserialize, Serialize};

use crate::enums::OptionKind;

// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2_PI: f64 = f64::from_bits(0x3fd9884533d43651);

/// Standard normal probability density.
#[inline(always)]
#[must_use]
pub fn norm_pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2_PI * (-0.5 * x * x).exp()
}

/// Standard normal cumulative distribution.
///
/// NaN inputs produce NaN.
#[inline(always)]
#[must_use]
pub fn norm_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    DefaultSpecialFn::norm_cdf(x)
}

/// Inputs for a single Black-Scholes valuation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    /// Spot price of the underlying (S).
    pub spot: f64,
    /// Strike price (K).
    pub strike: f64,
    /// Time to expiry in years (T).
    pub time_to_expiry: f64,
    /// Continuously compounded risk-free rate (r).
    pub rate: f64,
    /// Annualized volatility (vol).
    pub vol: f64,
    /// Continuous dividend yield (q).
    #[serde(default)]
    pub dividend_yield: f64,
    pub kind: OptionKind,
}

impl PricingRequest {
    /// Creates a new [`PricingRequest`] with a zero dividend yield.
    #[must_use]
    pub const fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        vol: f64,
        kind: OptionKind,
    ) -> Self {
        Self {
            spot,
            strike,
            time_to_expiry,
            rate,
            vol,
            dividend_yield: 0.0,
            kind,
        }
    }

    /// Creates a new [`PricingRequest`] with correctness checking.
    ///
    /// # Errors
    ///
    /// Returns an error if `spot`, `strike`, `time_to_expiry` or `vol` is not positive,
    /// `dividend_yield` is negative, or `rate` is not finite.
    pub fn new_checked(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        vol: f64,
        dividend_yield: f64,
        kind: OptionKind,
    ) -> anyhow::Result<Self> {
        check_positive_f64(spot, stringify!(spot))?;
        check_positive_f64(strike, stringify!(strike))?;
        check_positive_f64(time_to_expiry, stringify!(time_to_expiry))?;
        check_finite_f64(rate, stringify!(rate))?;
        check_positive_f64(vol, stringify!(vol))?;
        check_non_negative_f64(dividend_yield, stringify!(dividend_yield))?;

        Ok(Self {
            spot,
            strike,
            time_to_expiry,
            rate,
            vol,
            dividend_yield,
            kind,
        })
    }

    /// Returns a copy with the given continuous dividend yield.
    #[must_use]
    pub const fn with_dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    /// Returns a copy with the given volatility.
    #[must_use]
    pub const fn with_vol(mut self, vol: f64) -> Self {
        self.vol = vol;
        self
    }

    /// Spot discounted by the dividend yield, `S * e^(-qT)`.
    #[must_use]
    pub fn discounted_spot(&self) -> f64 {
        self.spot * (-self.dividend_yield * self.time_to_expiry).exp()
    }

    /// Strike discounted by the risk-free rate, `K * e^(-rT)`.
    #[must_use]
    pub fn discounted_strike(&self) -> f64 {
        self.strike * (-self.rate * self.time_to_expiry).exp()
    }
}

/// Black-Scholes sensitivities in raw units (per unit of spot, per unit of vol, per year).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlackScholesGreeks {
    pub price: f64,
    pub vol: f64,
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub rho: f64,
}

/// Returns `(d1, d2)` for the request.
#[inline(always)]
#[must_use]
pub fn d1_d2(req: &PricingRequest) -> (f64, f64) {
    let vol_sqrt_t = req.vol * req.time_to_expiry.sqrt();
    let d1 = ((req.spot / req.strike).ln()
        + (req.rate - req.dividend_yield + 0.5 * req.vol * req.vol) * req.time_to_expiry)
        / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

/// Returns the Black-Scholes theoretical price.
#[must_use]
pub fn black_scholes_price(req: &PricingRequest) -> f64 {
    let (d1, d2) = d1_d2(req);
    let s_t = req.discounted_spot();
    let k_t = req.discounted_strike();

    match req.kind {
        OptionKind::Call => s_t * norm_cdf(d1) - k_t * norm_cdf(d2),
        OptionKind::Put => k_t * norm_cdf(-d2) - s_t * norm_cdf(-d1),
    }
}

/// Returns the vega, the derivative of the price with respect to vol.
///
/// Identical for calls and puts: `S * e^(-qT) * n(d1) * sqrt(T)`.
#[must_use]
pub fn black_scholes_vega(req: &PricingRequest) -> f64 {
    let (d1, _) = d1_d2(req);
    req.discounted_spot() * norm_pdf(d1) * req.time_to_expiry.sqrt()
}

/// Lightweight kernel for the implied vol search, returning `(price, vega)` from a single
/// evaluation of `d1` and `d2`.
#[inline(always)]
#[must_use]
pub fn price_and_vega(req: &PricingRequest) -> (f64, f64) {
    let (d1, d2) = d1_d2(req);
    let s_t = req.discounted_spot();
    let k_t = req.discounted_strike();

    let price = match req.kind {
        OptionKind::Call => s_t * norm_cdf(d1) - k_t * norm_cdf(d2),
        OptionKind::Put => k_t * norm_cdf(-d2) - s_t * norm_cdf(-d1),
    };
    let vega = s_t * norm_pdf(d1) * req.time_to_expiry.sqrt();

    (price, vega)
}

/// Returns the price together with the first-order sensitivities and theta.
#[must_use]
pub fn black_scholes_greeks(req: &PricingRequest) -> BlackScholesGreeks {
    let phi = req.kind.sign();
    let (d1, d2) = d1_d2(req);
    let sqrt_t = req.time_to_expiry.sqrt();
    let dividend_df = (-req.dividend_yield * req.time_to_expiry).exp();
    let s_t = req.discounted_spot();
    let k_t = req.discounted_strike();
    let cdf_phi_d1 = norm_cdf(phi * d1);
    let cdf_phi_d2 = norm_cdf(phi * d2);
    let pdf_d1 = norm_pdf(d1);

    let price = phi * (s_t * cdf_phi_d1 - k_t * cdf_phi_d2);
    let delta = phi * dividend_df * cdf_phi_d1;
    let gamma = dividend_df * pdf_d1 / (req.spot * req.vol * sqrt_t);
    let vega = s_t * pdf_d1 * sqrt_t;
    let theta = -s_t * pdf_d1 * req.vol / (2.0 * sqrt_t) - phi * req.rate * k_t * cdf_phi_d2
        + phi * req.dividend_yield * s_t * cdf_phi_d1;
    let rho = phi * req.time_to_expiry * k_t * cdf_phi_d2;

    BlackScholesGreeks {
        price,
        vol: req.vol,
        delta,
        gamma,
        vega,
        theta,
        rho,
    }
}

/// Returns the undiscounted payoff if exercised now.
#[must_use]
pub fn intrinsic_value(spot: f64, strike: f64, kind: OptionKind) -> f64 {
    (kind.sign() * (spot - strike)).max(0.0)
}

/// Returns the zero-volatility limit of the price, `max(phi * (S e^(-qT) - K e^(-rT)), 0)`.
#[must_use]
pub fn discounted_intrinsic(req: &PricingRequest) -> f64 {
    (req.kind.sign() * (req.discounted_spot() - req.discounted_strike())).max(0.0)
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[fixture]
    fn textbook_call() -> PricingRequest {
        PricingRequest::new(100.0, 100.0, 1.0, 0.05, 0.2, OptionKind::Call)
    }

    #[rstest]
    fn test_textbook_call_and_put(textbook_call: PricingRequest) {
        let call = black_scholes_price(&textbook_call);
        let put = black_scholes_price(&PricingRequest {
            kind: OptionKind::Put,
            ..textbook_call
        });
        assert!((call - 10.450_583_572_185_565).abs() < 1e-10, "call={call}");
        assert!((put - 5.573_526_022_256_971).abs() < 1e-10, "put={put}");
    }

    #[rstest]
    #[case(100.0, 100.0, 1.0, 0.05, 0.2, 0.0)]
    #[case(100.0, 80.0, 0.25, 0.01, 0.35, 0.02)]
    #[case(50.0, 75.0, 2.0, 0.03, 0.6, 0.01)]
    #[case(4_500.0, 4_200.0, 0.1, -0.005, 0.15, 0.0)]
    #[case(20.0, 20.5, 0.02, 0.05, 1.2, 0.04)]
    fn test_put_call_parity(
        #[case] s: f64,
        #[case] k: f64,
        #[case] t: f64,
        #[case] r: f64,
        #[case] vol: f64,
        #[case] q: f64,
    ) {
        let call_req =
            PricingRequest::new(s, k, t, r, vol, OptionKind::Call).with_dividend_yield(q);
        let put_req = PricingRequest {
            kind: OptionKind::Put,
            ..call_req
        };
        let lhs = black_scholes_price(&call_req) - black_scholes_price(&put_req);
        let rhs = s * (-q * t).exp() - k * (-r * t).exp();
        assert!(
            (lhs - rhs).abs() < 1e-9 * s.max(1.0),
            "parity violated: lhs={lhs}, rhs={rhs}"
        );
    }

    #[rstest]
    #[case(OptionKind::Call, 100.0)]
    #[case(OptionKind::Put, 100.0)]
    #[case(OptionKind::Call, 130.0)]
    #[case(OptionKind::Put, 70.0)]
    fn test_price_non_decreasing_in_vol(#[case] kind: OptionKind, #[case] strike: f64) {
        let base = PricingRequest::new(100.0, strike, 0.5, 0.03, 0.01, kind);
        let mut prev = black_scholes_price(&base);
        for i in 2..=300 {
            let vol = f64::from(i) * 0.01;
            let price = black_scholes_price(&base.with_vol(vol));
            assert!(price >= prev - 1e-12, "vol={vol}: {price} < {prev}");
            assert!(price >= 0.0);
            prev = price;
        }
    }

    #[rstest]
    #[case(OptionKind::Call, 90.0)]
    #[case(OptionKind::Call, 120.0)]
    #[case(OptionKind::Put, 120.0)]
    #[case(OptionKind::Put, 90.0)]
    fn test_small_vol_approaches_discounted_intrinsic(
        #[case] kind: OptionKind,
        #[case] strike: f64,
    ) {
        let req = PricingRequest::new(100.0, strike, 1.0, 0.05, 1e-6, kind).with_dividend_yield(0.01);
        let price = black_scholes_price(&req);
        let limit = discounted_intrinsic(&req);
        assert!((price - limit).abs() < 1e-9, "price={price}, limit={limit}");
    }

    #[rstest]
    fn test_vega_matches_central_difference(textbook_call: PricingRequest) {
        let h = 1e-5;
        let req = textbook_call.with_dividend_yield(0.02);
        let up = black_scholes_price(&req.with_vol(req.vol + h));
        let down = black_scholes_price(&req.with_vol(req.vol - h));
        let numeric = (up - down) / (2.0 * h);
        let analytic = black_scholes_vega(&req);
        assert!((numeric - analytic).abs() < 1e-6, "numeric={numeric}, analytic={analytic}");
    }

    #[rstest]
    fn test_vega_is_identical_for_call_and_put(textbook_call: PricingRequest) {
        let put = PricingRequest {
            kind: OptionKind::Put,
            ..textbook_call
        };
        assert_eq!(black_scholes_vega(&textbook_call), black_scholes_vega(&put));
        assert!((black_scholes_vega(&textbook_call) - 37.524_034_691_693_79).abs() < 1e-9);
    }

    #[rstest]
    #[case(OptionKind::Call)]
    #[case(OptionKind::Put)]
    fn test_price_and_vega_agrees_with_separate_calls(#[case] kind: OptionKind) {
        let req = PricingRequest::new(42.0, 40.0, 0.5, 0.1, 0.2, kind).with_dividend_yield(0.03);
        let (price, vega) = price_and_vega(&req);
        assert_eq!(price, black_scholes_price(&req));
        assert_eq!(vega, black_scholes_vega(&req));
    }

    #[rstest]
    fn test_greeks_consistency(textbook_call: PricingRequest) {
        let req = textbook_call.with_dividend_yield(0.01);
        let call = black_scholes_greeks(&req);
        let put = black_scholes_greeks(&PricingRequest {
            kind: OptionKind::Put,
            ..req
        });

        assert!((call.price - black_scholes_price(&req)).abs() < 1e-12);
        assert!((call.delta - put.delta - (-0.01_f64).exp()).abs() < 1e-12);
        assert!((call.gamma - put.gamma).abs() < 1e-15);
        assert!(call.gamma > 0.0);
        assert_eq!(call.vega, put.vega);
        assert!(call.theta < 0.0);
        assert!(call.rho > 0.0);
        assert!(put.rho < 0.0);
        assert_eq!(call.vol, 0.2);
    }

    #[rstest]
    fn test_delta_matches_central_difference(textbook_call: PricingRequest) {
        let h = 1e-4;
        let up = black_scholes_price(&PricingRequest {
            spot: textbook_call.spot + h,
            ..textbook_call
        });
        let down = black_scholes_price(&PricingRequest {
            spot: textbook_call.spot - h,
            ..textbook_call
        });
        let numeric = (up - down) / (2.0 * h);
        let delta = black_scholes_greeks(&textbook_call).delta;
        assert!((numeric - delta).abs() < 1e-7, "numeric={numeric}, delta={delta}");
    }

    #[rstest]
    fn test_zero_vol_at_the_money_is_nan() {
        let req = PricingRequest::new(100.0, 100.0, 1.0, 0.0, 0.0, OptionKind::Call);
        assert!(black_scholes_price(&req).is_nan());
    }

    #[rstest]
    fn test_new_checked_valid() {
        let req = PricingRequest::new_checked(100.0, 95.0, 0.5, 0.04, 0.25, 0.01, OptionKind::Put)
            .unwrap();
        assert_eq!(req.dividend_yield, 0.01);
        assert_eq!(req.kind, OptionKind::Put);
    }

    #[rstest]
    #[case(0.0, 100.0, 1.0, 0.2, 0.0)]
    #[case(100.0, -1.0, 1.0, 0.2, 0.0)]
    #[case(100.0, 100.0, 0.0, 0.2, 0.0)]
    #[case(100.0, 100.0, 1.0, 0.0, 0.0)]
    #[case(100.0, 100.0, 1.0, 0.2, -0.01)]
    #[case(f64::NAN, 100.0, 1.0, 0.2, 0.0)]
    fn test_new_checked_invalid(
        #[case] s: f64,
        #[case] k: f64,
        #[case] t: f64,
        #[case] vol: f64,
        #[case] q: f64,
    ) {
        assert!(PricingRequest::new_checked(s, k, t, 0.05, vol, q, OptionKind::Call).is_err());
    }

    #[rstest]
    #[case(60_000.0, 50_000.0, OptionKind::Call, 10_000.0)]
    #[case(40_000.0, 50_000.0, OptionKind::Put, 10_000.0)]
    #[case(40_000.0, 50_000.0, OptionKind::Call, 0.0)]
    #[case(60_000.0, 50_000.0, OptionKind::Put, 0.0)]
    fn test_intrinsic_value(
        #[case] spot: f64,
        #[case] strike: f64,
        #[case] kind: OptionKind,
        #[case] expected: f64,
    ) {
        assert_eq!(intrinsic_value(spot, strike, kind), expected);
    }

    #[rstest]
    fn test_norm_cdf() {
        assert_eq!(norm_cdf(0.0), 0.5);
        assert!((norm_cdf(0.5) + norm_cdf(-0.5) - 1.0).abs() < 1e-15);
        assert!((norm_cdf(1.96) - 0.975_002_104_851_779_5).abs() < 1e-12);
        assert!((norm_cdf(10.0) - 1.0).abs() < 1e-15);
        assert!(norm_cdf(-40.0) >= 0.0);
        assert!(norm_cdf(f64::NAN).is_nan());
    }

    #[rstest]
    fn test_norm_pdf() {
        assert!((norm_pdf(0.0) - 0.398_942_280_401_432_7).abs() < 1e-16);
        assert_eq!(norm_pdf(1.3), norm_pdf(-1.3));
    }
}
