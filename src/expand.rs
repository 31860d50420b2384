// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Scale-Up Suite - Curve Expansion
//
// Resamples a trader's value or cost schedule when the market population is
// multiplied by an integer factor. Two policies are supported: repeating each
// unit (`duplicate`) and linear filling between neighbouring units
// (`interpolate`).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from curve expansion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpandError {
    #[error("expansion factor must be a positive integer, got {factor}")]
    InvalidFactor { factor: f64 },
    #[error("cannot interpolate an empty curve")]
    EmptyCurve,
}

// ---------------------------------------------------------------------------
// ExpansionFactor
// ---------------------------------------------------------------------------

/// Integer multiplier applied to population size and curve length. Always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "u64")]
pub struct ExpansionFactor(usize);

impl ExpansionFactor {
    pub const IDENTITY: ExpansionFactor = ExpansionFactor(1);

    pub fn new(factor: usize) -> Result<Self, ExpandError> {
        if factor == 0 {
            return Err(ExpandError::InvalidFactor { factor: 0.0 });
        }
        Ok(Self(factor))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// Factors arrive from form inputs as plain numbers; fractional, negative,
/// zero and non-finite values are rejected rather than truncated.
impl TryFrom<f64> for ExpansionFactor {
    type Error = ExpandError;

    fn try_from(factor: f64) -> Result<Self, Self::Error> {
        if !factor.is_finite() || factor < 1.0 || factor.fract() != 0.0 || factor > usize::MAX as f64 {
            return Err(ExpandError::InvalidFactor { factor });
        }
        Ok(Self(factor as usize))
    }
}

impl From<ExpansionFactor> for u64 {
    fn from(factor: ExpansionFactor) -> u64 {
        factor.0 as u64
    }
}

impl std::fmt::Display for ExpansionFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Repeat every unit `factor` times in place.
///
/// `duplicate(&[10.0, 8.0], 2) == [10.0, 10.0, 8.0, 8.0]`. An empty curve stays empty.
pub fn duplicate(curve: &[f64], factor: ExpansionFactor) -> Vec<f64> {
    let n = factor.get();
    let mut result = Vec::with_capacity(curve.len() * n);
    for &value in curve {
        result.extend(std::iter::repeat(value).take(n));
    }
    result
}

/// Fill `factor` linearly spaced points between each pair of neighbouring
/// units, then repeat the last unit `factor` times.
///
/// Each block starts exactly at `curve[i]` and stops one step short of
/// `curve[i + 1]`. No rounding or clamping is applied to the fill points.
pub fn interpolate(curve: &[f64], factor: ExpansionFactor) -> Result<Vec<f64>, ExpandError> {
    let last = *curve.last().ok_or(ExpandError::EmptyCurve)?;
    let n = factor.get();
    let nf = n as f64;
    let mut result = Vec::with_capacity(curve.len() * n);
    for pair in curve.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        result.push(a);
        for j in 1..n {
            let jf = j as f64;
            result.push((a * (nf - jf) + b * jf) / nf);
        }
    }
    result.extend(std::iter::repeat(last).take(n));
    Ok(result)
}

/// Selects which resampling rule `expand_curve` applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionPolicy {
    Duplicate,
    Interpolate,
}

impl ExpansionPolicy {
    pub fn apply(self, curve: &[f64], factor: ExpansionFactor) -> Result<Vec<f64>, ExpandError> {
        match self {
            Self::Duplicate => Ok(duplicate(curve, factor)),
            Self::Interpolate => interpolate(curve, factor),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::Interpolate => "interpolate",
        }
    }
}

impl std::str::FromStr for ExpansionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "duplicate" | "dup" => Ok(Self::Duplicate),
            "interpolate" | "interp" => Ok(Self::Interpolate),
            other => Err(format!("unknown expansion policy: {}", other)),
        }
    }
}

/// Expand a curve under `policy`. Empty curves pass through unchanged for
/// both policies so configurations without a buyer or seller side still scale.
pub fn expand_curve(
    curve: &[f64],
    policy: ExpansionPolicy,
    factor: ExpansionFactor,
) -> Result<Vec<f64>, ExpandError> {
    if curve.is_empty() {
        return Ok(Vec::new());
    }
    policy.apply(curve, factor)
}

/// Population rule paired with every curve expansion: a lone trader is a
/// monopolist (or monopsonist) and is never multiplied.
pub fn scale_population(count: u32, factor: ExpansionFactor) -> u32 {
    if count > 1 {
        count.saturating_mul(factor.get().min(u32::MAX as usize) as u32)
    } else {
        count
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn f(n: usize) -> ExpansionFactor {
        ExpansionFactor::new(n).unwrap()
    }

    #[test]
    fn test_duplicate_example() {
        let out = duplicate(&[10.0, 8.0, 5.0], f(3));
        assert_eq!(out, vec![10.0, 10.0, 10.0, 8.0, 8.0, 8.0, 5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_duplicate_empty_curve() {
        assert!(duplicate(&[], f(4)).is_empty());
    }

    #[test]
    fn test_interpolate_example() {
        let out = interpolate(&[10.0, 4.0], f(2)).unwrap();
        assert_eq!(out, vec![10.0, 7.0, 4.0, 4.0]);
    }

    #[test]
    fn test_interpolate_singleton_repeats_tail() {
        let out = interpolate(&[10.0], f(3)).unwrap();
        assert_eq!(out, vec![10.0, 10.0, 10.0]);
    }

    #[test]
    fn test_interpolate_empty_is_error() {
        assert_eq!(interpolate(&[], f(2)), Err(ExpandError::EmptyCurve));
    }

    #[test]
    fn test_interpolate_no_rounding() {
        // (1*2 + 2*1)/3 = 4/3
        let out = interpolate(&[1.0, 2.0], f(3)).unwrap();
        assert_eq!(out[1], (1.0 * 2.0 + 2.0 * 1.0) / 3.0);
        assert_eq!(out[2], (1.0 * 1.0 + 2.0 * 2.0) / 3.0);
    }

    #[test]
    fn test_identity_factor() {
        let curve = [120.0, 95.5, 80.0, 10.0];
        assert_eq!(duplicate(&curve, ExpansionFactor::IDENTITY), curve.to_vec());
        assert_eq!(interpolate(&curve, ExpansionFactor::IDENTITY).unwrap(), curve.to_vec());
    }

    #[test]
    fn test_factor_rejects_zero_and_fractions() {
        assert!(ExpansionFactor::new(0).is_err());
        assert!(ExpansionFactor::try_from(0.0).is_err());
        assert!(ExpansionFactor::try_from(-2.0).is_err());
        assert!(ExpansionFactor::try_from(2.5).is_err());
        assert!(ExpansionFactor::try_from(f64::NAN).is_err());
        assert_eq!(ExpansionFactor::try_from(4.0).unwrap().get(), 4);
    }

    #[test]
    fn test_factor_serde() {
        let factor: ExpansionFactor = serde_json::from_str("3").unwrap();
        assert_eq!(factor.get(), 3);
        assert!(serde_json::from_str::<ExpansionFactor>("0").is_err());
        assert_eq!(serde_json::to_string(&factor).unwrap(), "3");
        let typed: ExpansionFactor = serde_json::from_str("4.0").unwrap();
        assert_eq!(serde_json::to_value(typed).unwrap(), serde_json::json!(4));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Duplicate".parse::<ExpansionPolicy>().unwrap(), ExpansionPolicy::Duplicate);
        assert_eq!("interp".parse::<ExpansionPolicy>().unwrap(), ExpansionPolicy::Interpolate);
        assert!("resample".parse::<ExpansionPolicy>().is_err());
    }

    #[test]
    fn test_expand_curve_empty_passes_through() {
        let out = expand_curve(&[], ExpansionPolicy::Interpolate, f(5)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_scale_population_monopolist_kept() {
        assert_eq!(scale_population(1, f(10)), 1);
        assert_eq!(scale_population(0, f(10)), 0);
        assert_eq!(scale_population(3, f(10)), 30);
        assert_eq!(scale_population(u32::MAX, f(2)), u32::MAX);
    }
}
