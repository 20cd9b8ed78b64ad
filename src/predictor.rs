// Copyright 2024 lsgcodec contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Deterministic prediction functions over a segment.
//!
//! A predictor is a closed, three-case tagged variant (mean, linear,
//! random-walk); the on-wire `predictor_type` field is a narrow enum and
//! is never opened for extension.

use crate::error::CodecError;

/// The predictor fitted and stored for one segment.
///
/// `predictor_type` on the wire is the `u32` discriminant below (0, 1, 2);
/// all other values are illegal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum PredictorKind {
    Mean = 0,
    Linear = 1,
    RandomWalk = 2,
}

impl PredictorKind {
    pub fn from_u32(value: u32) -> Result<PredictorKind, CodecError> {
        match value {
            0 => Ok(PredictorKind::Mean),
            1 => Ok(PredictorKind::Linear),
            2 => Ok(PredictorKind::RandomWalk),
            other => Err(CodecError::InvalidFormat(format!(
                "unknown predictor_type {}",
                other
            ))),
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// The fitted parameters of a predictor, as stored in a `SegmentEntry`.
///
/// Unused fields for a given [`PredictorKind`] are zero (e.g. `slope` and
/// `seed_value` for a mean predictor).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PredictorParams {
    pub mean: f64,
    pub slope: f64,
    pub intercept: f64,
    pub seed_value: f64,
}

/// Fits the constant-mean predictor: `pred(i) = mean` for all `i`.
pub fn fit_mean(samples: &[f64]) -> PredictorParams {
    let mean = if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    };
    PredictorParams {
        mean,
        slope: 0.0,
        intercept: mean,
        seed_value: 0.0,
    }
}

/// Fits the linear predictor `pred(i) = intercept + slope * i` by ordinary
/// least squares on `(i, sample)` pairs, via the closed-form sums.
///
/// For a single-sample segment, or whenever the OLS denominator
/// `L*sum_i2 - sum_i^2` is zero (which for integer positions 0..L only
/// happens at L=1), slope is 0 and intercept equals the mean.
pub fn fit_linear(samples: &[f64]) -> PredictorParams {
    let l = samples.len();
    let mean_params = fit_mean(samples);
    if l <= 1 {
        return PredictorParams {
            mean: mean_params.mean,
            slope: 0.0,
            intercept: mean_params.mean,
            seed_value: 0.0,
        };
    }

    let n = l as f64;
    let mut sum_i = 0.0;
    let mut sum_i2 = 0.0;
    let mut sum_x = 0.0;
    let mut sum_ix = 0.0;
    for (i, &x) in samples.iter().enumerate() {
        let fi = i as f64;
        sum_i += fi;
        sum_i2 += fi * fi;
        sum_x += x;
        sum_ix += fi * x;
    }

    let denom = n * sum_i2 - sum_i * sum_i;
    let (slope, intercept) = if denom == 0.0 {
        (0.0, mean_params.mean)
    } else {
        let slope = (n * sum_ix - sum_i * sum_x) / denom;
        let intercept = (sum_x - slope * sum_i) / n;
        (slope, intercept)
    };

    PredictorParams {
        mean: mean_params.mean,
        slope,
        intercept,
        seed_value: 0.0,
    }
}

/// Fits the random-walk predictor: the seed is the first original sample
/// of the segment. Prediction for subsequent positions depends on
/// reconstructed values and is therefore not computed here; see
/// [`crate::container`] for the encode/decode-time iteration.
pub fn fit_random_walk(samples: &[f64]) -> PredictorParams {
    PredictorParams {
        mean: 0.0,
        slope: 0.0,
        intercept: 0.0,
        seed_value: samples.first().copied().unwrap_or(0.0),
    }
}

/// Evaluates the mean or linear predictor at intra-segment position `i`.
///
/// Not valid for [`PredictorKind::RandomWalk`], whose prediction at `i>0`
/// depends on the reconstructed value at `i-1` and must be computed
/// iteratively by the caller.
pub fn predict_static(kind: PredictorKind, params: &PredictorParams, i: usize) -> f64 {
    match kind {
        PredictorKind::Mean => params.mean,
        PredictorKind::Linear => params.intercept + params.slope * i as f64,
        PredictorKind::RandomWalk => {
            panic!("random-walk prediction must be computed iteratively, not via predict_static")
        }
    }
}

/// Mean squared error of `predicted` against `actual`. Used by the
/// segmenter's probe fit and the "auto" predictor selection; this
/// operates on un-quantized residuals.
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    if actual.is_empty() {
        return 0.0;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p) * (a - p))
        .sum();
    sum / actual.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_predictor_is_constant() {
        let samples = [1.0, 2.0, 3.0, 4.0];
        let params = fit_mean(&samples);
        assert_eq!(params.mean, 2.5);
        for i in 0..samples.len() {
            assert_eq!(predict_static(PredictorKind::Mean, &params, i), 2.5);
        }
    }

    #[test]
    fn linear_predictor_recovers_exact_line() {
        let samples: Vec<f64> = (0..10).map(|i| 2.0 * i as f64 + 3.0).collect();
        let params = fit_linear(&samples);
        assert!((params.slope - 2.0).abs() < 1e-9);
        assert!((params.intercept - 3.0).abs() < 1e-9);
        for (i, &x) in samples.iter().enumerate() {
            let pred = predict_static(PredictorKind::Linear, &params, i);
            assert!((pred - x).abs() < 1e-9);
        }
    }

    #[test]
    fn linear_predictor_single_sample_has_zero_slope() {
        let samples = [7.0];
        let params = fit_linear(&samples);
        assert_eq!(params.slope, 0.0);
        assert_eq!(params.intercept, 7.0);
    }

    #[test]
    fn random_walk_seed_is_first_sample() {
        let samples = [4.0, 5.0, 6.0];
        let params = fit_random_walk(&samples);
        assert_eq!(params.seed_value, 4.0);
    }

    #[test]
    fn predictor_kind_round_trips_through_u32() {
        for kind in [
            PredictorKind::Mean,
            PredictorKind::Linear,
            PredictorKind::RandomWalk,
        ] {
            assert_eq!(PredictorKind::from_u32(kind.as_u32()).unwrap(), kind);
        }
        assert!(PredictorKind::from_u32(3).is_err());
    }
}
