// Copyright 2024 lsgcodec contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! The `error` module defines the error and result types used throughout
//! the crate.

use thiserror::Error;

/// An error that prevents encoding or decoding a time series.
#[derive(Error, Debug, PartialEq)]
pub enum CodecError {
    /// Bad caller-supplied input: an empty series, or an invalid option.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The byte stream is not a well-formed LSG2 container.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The byte stream ends before a required field or payload was read.
    #[error("truncated input: {0}")]
    Truncated(String),

    /// A declared size disagrees with the data that actually follows it.
    #[error("inconsistent sizes: {0}")]
    InconsistentSizes(String),

    /// A varint did not terminate within 10 bytes.
    #[error("varint overflow")]
    Overflow,
}

/// Either `T` on success, or a `CodecError` on failure.
pub type CodecResult<T> = Result<T, CodecError>;
