//! Year-over-year blending of completion ratios

use crate::{MathError, Result};

/// Outcome of blending the one-year and two-year reference ratios
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Blend {
    /// Both reference years were available: `w·r1 + (1 − w)·r2`
    Weighted(f64),
    /// Only the one-year ratio was available; the weight was not applied
    OneYearOnly(f64),
}

impl Blend {
    /// The blended ratio
    pub fn ratio(&self) -> f64 {
        match *self {
            Blend::Weighted(ratio) | Blend::OneYearOnly(ratio) => ratio,
        }
    }
}

/// Check that a blending weight lies in `[0, 1]`
pub fn validate_weight(weight: f64) -> Result<f64> {
    if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
        return Err(MathError::InvalidInput(format!(
            "Weight must be between 0 and 1, got {}",
            weight
        )));
    }

    Ok(weight)
}

/// Blend the ratio observed one year back with the one observed two years back.
///
/// With both ratios present the result is `weight·one_year + (1 − weight)·two_years`.
/// Without `two_years`, `one_year` is returned unchanged and `weight` is
/// ignored.
///
/// # Examples
///
/// ```
/// use month_math::blend_ratios;
///
/// let blended = blend_ratios(0.5, 0.4, Some(0.2));
/// assert!((blended.ratio() - 0.3).abs() < 1e-12);
///
/// let degraded = blend_ratios(0.5, 0.4, None);
/// assert_eq!(degraded.ratio(), 0.4);
/// ```
pub fn blend_ratios(weight: f64, one_year: f64, two_years: Option<f64>) -> Blend {
    match two_years {
        Some(r2) => Blend::Weighted(weight * one_year + (1.0 - weight) * r2),
        None => Blend::OneYearOnly(one_year),
    }
}
