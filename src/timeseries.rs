// Copyright 2024 lsgcodec contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! The in-memory representation of an input (or reconstructed) sample
//! sequence, paired with its sampling metadata.

/// An ordered sequence of samples plus sampling metadata.
///
/// The sample count is bounded at decode time to
/// [`crate::container::MAX_POINTS`]; this struct itself places no limit
/// on `samples.len()` so that callers can build up an input incrementally.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    pub samples: Vec<f64>,
    /// Sampling interval in seconds.
    pub dt: f64,
    /// Opaque start timestamp; ISO-8601 is recommended but not validated.
    pub t0: String,
    /// Opaque unit string.
    pub unit: String,
}

impl TimeSeries {
    pub fn new(samples: Vec<f64>, dt: f64, t0: impl Into<String>, unit: impl Into<String>) -> Self {
        TimeSeries {
            samples,
            dt,
            t0: t0.into(),
            unit: unit.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
