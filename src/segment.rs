// Copyright 2024 lsgcodec contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Partitions the input index range into contiguous, non-overlapping
//! segments, either by fixed length or by an adaptive
//! extend-while-MSE-bounded rule.

use crate::error::{CodecError, CodecResult};
use crate::predictor::{fit_linear, fit_mean, mse, predict_static, PredictorKind};

/// A fitted segment descriptor, as stored in the container's segment
/// table (`SegmentEntry` in the format specification).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Segment {
    pub start_idx: u32,
    pub end_idx: u32,
    pub predictor: PredictorKind,
    pub mean: f64,
    pub slope: f64,
    pub intercept: f64,
    pub quant_step: f64,
    pub seed_value: f64,
}

impl Segment {
    /// Number of samples covered by this segment.
    pub fn len(&self) -> usize {
        (self.end_idx - self.start_idx + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// How the caller wants the input partitioned into segments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SegmentMode {
    /// Partition into consecutive segments of `length`, the final one
    /// possibly shorter. `length` must be positive.
    Fixed { length: usize },
    /// Greedily extend each segment while a probe predictor's MSE stays
    /// at or below `mse_threshold`, within `[min_len, max_len]`.
    Adaptive {
        min_len: usize,
        max_len: usize,
        mse_threshold: f64,
    },
}

/// Which predictor the adaptive segmenter should probe with while
/// deciding segment boundaries. This mirrors the encoder's predictor
/// choice: `Auto` probes with `Linear`, per spec.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProbePredictor {
    Mean,
    Linear,
    RandomWalk,
}

impl ProbePredictor {
    fn fit_and_predict(self, samples: &[f64]) -> Vec<f64> {
        match self {
            ProbePredictor::Mean => {
                let params = fit_mean(samples);
                (0..samples.len())
                    .map(|i| predict_static(PredictorKind::Mean, &params, i))
                    .collect()
            }
            ProbePredictor::Linear => {
                let params = fit_linear(samples);
                (0..samples.len())
                    .map(|i| predict_static(PredictorKind::Linear, &params, i))
                    .collect()
            }
            ProbePredictor::RandomWalk => {
                // The probe runs on raw samples only (no quantization), so
                // random-walk prediction here is simply the previous raw
                // sample -- there is no reconstructed value yet.
                let mut out = Vec::with_capacity(samples.len());
                for i in 0..samples.len() {
                    if i == 0 {
                        out.push(samples[0]);
                    } else {
                        out.push(samples[i - 1]);
                    }
                }
                out
            }
        }
    }
}

/// Partitions `[0, n)` into contiguous (start, end-inclusive) index
/// ranges according to `mode`.
///
/// For `n == 0`, returns an empty partition regardless of mode.
pub fn plan_segments(
    samples: &[f64],
    mode: SegmentMode,
    probe: ProbePredictor,
) -> CodecResult<Vec<(usize, usize)>> {
    let n = samples.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    match mode {
        SegmentMode::Fixed { length } => {
            if length == 0 {
                return Err(CodecError::InvalidInput(
                    "segment_length must be positive".to_string(),
                ));
            }
            let mut out = Vec::new();
            let mut start = 0;
            while start < n {
                let end = (start + length).min(n) - 1;
                out.push((start, end));
                start = end + 1;
            }
            Ok(out)
        }
        SegmentMode::Adaptive {
            min_len,
            max_len,
            mse_threshold,
        } => {
            if min_len < 1 || max_len < min_len {
                return Err(CodecError::InvalidInput(
                    "adaptive segmenter requires min_len >= 1 and max_len >= min_len".to_string(),
                ));
            }
            let mut out = Vec::new();
            let mut start = 0;
            while start < n {
                let mut end = (start + min_len).min(n) - 1;
                let mut best_end = end;
                loop {
                    let window = &samples[start..=end];
                    let predicted = probe.fit_and_predict(window);
                    let error = mse(window, &predicted);
                    if error <= mse_threshold {
                        best_end = end;
                        let len = end - start + 1;
                        if end + 1 < n && len < max_len {
                            end += 1;
                            continue;
                        }
                    }
                    break;
                }
                out.push((start, best_end));
                start = best_end + 1;
            }
            Ok(out)
        }
    }
}
