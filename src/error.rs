// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal configuration and collaborator errors.
///
/// Recoverable problems (malformed numeric properties, unknown propagation
/// formats, bad tag tokens) are logged and resolved to defaults instead of
/// being surfaced here.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The service name was null, empty, or whitespace-only.
    #[error("service name must not be null or empty")]
    InvalidServiceName,

    /// A non-blank sampler type that matches no known sampling strategy.
    #[error("invalid sampling strategy {0}")]
    InvalidSamplingStrategy(String),

    /// A probabilistic sampling rate outside of [0.0, 1.0].
    #[error("the sampling rate must be greater than 0.0 and less than 1.0, got {0}")]
    InvalidSamplingRate(f64),

    /// A remote sampling strategy query failed.
    #[error("sampling strategy query failed: {0}")]
    SamplingStrategy(String),

    /// A sender refused or failed to take spans.
    #[error("sender failure: {0}")]
    Sender(String),
}
