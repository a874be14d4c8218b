//! Fixed-point arithmetic kernel.
//!
//! Token amounts and rate factors are `u128` scaled by
//! [`FIXED_POINT_SCALE`](crate::constants::FIXED_POINT_SCALE). Intermediate
//! products of two such values exceed 128 bits (supply alone is ~10^28),
//! so every multiply-then-divide routes through a `BigUint` intermediate
//! and narrows back with an explicit overflow check.
//!
//! All divisions truncate toward zero. Truncation may leave negligible
//! residual value unattributed; the engine guarantees monotone,
//! non-negative accrual, not conservation to the last grain.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::MathError;

/// Compute `a * b / denom` with a full-width intermediate, truncating.
pub fn mul_div(a: u128, b: u128, denom: u128) -> Result<u128, MathError> {
    if denom == 0 {
        return Err(MathError::DivisionByZero);
    }
    let wide = BigUint::from(a) * BigUint::from(b) / BigUint::from(denom);
    wide.to_u128().ok_or(MathError::Overflow)
}

/// Fixed-point exponentiation: computes `(base/precision)^exp` in fixed-point.
///
/// Uses binary exponentiation for O(log n) multiplications, so block-count
/// exponents in the tens of millions stay cheap. `base` and the return
/// value are in fixed-point with `precision` as denominator.
///
/// Callers are responsible for choosing a `base` that keeps
/// `base^exp` within `u128` for the exponents they pass; out-of-range
/// combinations fail with [`MathError::Overflow`] rather than wrapping.
pub fn fixed_pow(base: u128, exp: u64, precision: u128) -> Result<u128, MathError> {
    if precision == 0 {
        return Err(MathError::DivisionByZero);
    }
    if exp == 0 {
        return Ok(precision); // (base/precision)^0 = 1.0
    }

    let mut result = precision;
    let mut b = base;
    let mut e = exp;

    while e > 0 {
        if e & 1 == 1 {
            result = mul_div(result, b, precision)?;
        }
        e >>= 1;
        if e > 0 {
            b = mul_div(b, b, precision)?;
        }
    }

    Ok(result)
}
