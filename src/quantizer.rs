// Copyright 2024 lsgcodec contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Maps a finite sequence of residual reals to signed integers via a
//! data-dependent step `Q`, derived from the residual standard deviation.

/// Default multiplier applied to the residual standard deviation to
/// derive the quantization step.
pub const DEFAULT_C_Q: f64 = 0.5;

/// Floor below which the quantization step is never allowed to fall.
pub const DEFAULT_Q_MIN: f64 = 1e-6;

/// Computes the quantization step for a sequence of residuals.
///
/// `Q = max(c_q * population_stddev(residuals), q_min)`. Empty input and
/// an all-zero (or otherwise zero-variance) residual sequence both yield
/// `q_min`.
pub fn fit_step(residuals: &[f64], c_q: f64, q_min: f64) -> f64 {
    if residuals.is_empty() {
        return q_min;
    }
    let n = residuals.len() as f64;
    let mean = residuals.iter().sum::<f64>() / n;
    let variance = residuals.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let q = c_q * stddev;
    if q > q_min {
        q
    } else {
        q_min
    }
}

/// Rounds `r / q` to the nearest integer, ties away from zero, and
/// returns it as a signed 32-bit quantized residual.
///
/// The encoder's rounding choice is the only observable source of
/// encoder-side divergence between implementations (decoding only
/// multiplies back by `q`); half-away-from-zero is fixed as the rule for
/// this codec.
pub fn quantize(r: f64, q: f64) -> i32 {
    let scaled = r / q;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5).floor()
    } else {
        (scaled - 0.5).ceil()
    };
    rounded as i32
}

/// Recovers an approximate residual from a quantized value: `q_i * Q`.
pub fn dequantize(q_i: i32, q: f64) -> f64 {
    q_i as f64 * q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_residuals_default_to_q_min() {
        assert_eq!(fit_step(&[], DEFAULT_C_Q, DEFAULT_Q_MIN), DEFAULT_Q_MIN);
    }

    #[test]
    fn zero_variance_residuals_floor_at_q_min() {
        let residuals = [0.0; 10];
        assert_eq!(fit_step(&residuals, DEFAULT_C_Q, DEFAULT_Q_MIN), DEFAULT_Q_MIN);
    }

    #[test]
    fn step_scales_with_stddev() {
        let residuals = [-2.0, -1.0, 0.0, 1.0, 2.0];
        let q = fit_step(&residuals, DEFAULT_C_Q, DEFAULT_Q_MIN);
        let mean = 0.0;
        let variance = residuals.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>()
            / residuals.len() as f64;
        assert!((q - DEFAULT_C_Q * variance.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn quantize_rounds_half_away_from_zero() {
        assert_eq!(quantize(0.5, 1.0), 1);
        assert_eq!(quantize(-0.5, 1.0), -1);
        assert_eq!(quantize(1.49, 1.0), 1);
        assert_eq!(quantize(1.5, 1.0), 2);
        assert_eq!(quantize(-1.5, 1.0), -2);
    }

    #[test]
    fn quantize_dequantize_is_within_half_step() {
        let q = 0.25;
        for r in [-3.3, -1.0, 0.0, 0.1, 2.7] {
            let qi = quantize(r, q);
            let back = dequantize(qi, q);
            assert!((back - r).abs() <= q / 2.0 + 1e-12);
        }
    }
}
