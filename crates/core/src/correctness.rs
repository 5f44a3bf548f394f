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

//! Functions for correctness checks similar to the *design by contract* philosophy.
//!
//! Each check returns an [`anyhow::Result`] so callers can either propagate the failure with `?`
//! or, where the inputs are already known to be valid, call `.expect(FAILED)`.

/// A message prefix used when a correctness check fails inside an infallible constructor.
pub const FAILED: &str = "Condition failed";

/// Checks the `f64` value is finite (not NaN or infinite).
///
/// # Errors
///
/// Returns an error if `value` is NaN or infinite.
#[inline(always)]
pub fn check_finite_f64(value: f64, param: &str) -> anyhow::Result<()> {
    if !value.is_finite() {
        anyhow::bail!("invalid f64 for '{param}', was {value}, must be finite")
    }
    Ok(())
}

/// Checks the `f64` value is strictly positive (> 0) and finite.
///
/// # Errors
///
/// Returns an error if `value` is NaN, infinite or not positive.
#[inline(always)]
pub fn check_positive_f64(value: f64, param: &str) -> anyhow::Result<()> {
    check_finite_f64(value, param)?;
    if value <= 0.0 {
        anyhow::bail!("invalid f64 for '{param}' not positive, was {value}")
    }
    Ok(())
}

/// Checks the `f64` value is non-negative (>= 0) and finite.
///
/// # Errors
///
/// Returns an error if `value` is NaN, infinite or negative.
#[inline(always)]
pub fn check_non_negative_f64(value: f64, param: &str) -> anyhow::Result<()> {
    check_finite_f64(value, param)?;
    if value < 0.0 {
        anyhow::bail!("invalid f64 for '{param}' negative, was {value}")
    }
    Ok(())
}

/// Checks the `usize` value is positive (> 0).
///
/// # Errors
///
/// Returns an error if `value` is zero.
#[inline(always)]
pub fn check_positive_usize(value: usize, param: &str) -> anyhow::Result<()> {
    if value == 0 {
        anyhow::bail!("invalid usize for '{param}' not positive, was {value}")
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(-0.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_check_positive_f64_when_invalid(#[case] value: f64) {
        assert!(check_positive_f64(value, "param").is_err());
    }

    #[rstest]
    #[case(1e-12)]
    #[case(0.2)]
    #[case(100.0)]
    fn test_check_positive_f64_when_valid(#[case] value: f64) {
        assert!(check_positive_f64(value, "param").is_ok());
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(0.03, true)]
    #[case(-0.01, false)]
    #[case(f64::NEG_INFINITY, false)]
    fn test_check_non_negative_f64(#[case] value: f64, #[case] expected: bool) {
        assert_eq!(check_non_negative_f64(value, "param").is_ok(), expected);
    }

    #[rstest]
    fn test_check_finite_f64_message_names_param() {
        let err = check_finite_f64(f64::NAN, "rate").unwrap_err();
        assert!(err.to_string().contains("'rate'"));
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(100, true)]
    fn test_check_positive_usize(#[case] value: usize, #[case] expected: bool) {
        assert_eq!(check_positive_usize(value, "max_iter").is_ok(), expected);
    }
}
