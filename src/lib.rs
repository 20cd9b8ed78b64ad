// Copyright 2024 lsgcodec contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! A lossy codec for univariate numeric time series.
//!
//! Given a sequence of samples and sampling metadata (interval, start
//! timestamp, unit), [`encode`] adaptively segments the input, fits one of
//! three predictors per segment, and quantizes the residuals into a
//! self-describing "LSG2 v1" binary container. [`decode`] reconstructs an
//! approximation of the original sequence from that container;
//! [`inspect`] reads the metadata and segment table without touching
//! residual payloads.
//!
//! The codec is lossy by design and single-threaded: `encode`/`decode`
//! are plain, synchronous functions over in-memory buffers with no shared
//! state, so callers may invoke them concurrently on disjoint inputs.

pub mod container;
pub mod error;
pub mod metadata;
pub mod predictor;
pub mod quantizer;
pub mod segment;
pub mod timeseries;
pub mod varint;

pub use container::{decode, encode, inspect, EncodeOptions, Inspection, PredictorChoice, ResidualCoding, MAX_POINTS, MAX_SEGMENTS};
pub use error::{CodecError, CodecResult};
pub use metadata::ContextMetadata;
pub use predictor::PredictorKind;
pub use segment::{Segment, SegmentMode};
pub use timeseries::TimeSeries;
