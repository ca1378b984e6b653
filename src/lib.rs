// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

//! Configuration-driven assembly of a Jaeger-style tracing client.
//!
//! The entry point is [`Configuration`]: it reads the `JAEGER_*` properties
//! (from the environment or any [`PropertySource`] stack), materializes the
//! sampler, reporter and propagation codecs they describe and owns the
//! resulting shared [`Tracer`].
//!
//! ```no_run
//! use jaeger_client::Configuration;
//!
//! let config = Configuration::from_env()?;
//! let tracer = config.get_tracer()?;
//! // ... trace ...
//! config.close_tracer();
//! # Ok::<(), jaeger_client::Error>(())
//! ```

pub mod config;
pub mod log;
pub mod metrics;
pub mod propagation;
pub mod reporter;
pub mod sampling;
pub mod sender;
pub mod tracer;

mod error;

pub use config::{
    CodecConfiguration, Configuration, PropertyResolver, PropertySource, ReporterConfiguration,
    SamplerConfiguration, SenderConfiguration,
};
pub use error::{Error, Result};
pub use tracer::{Span, Tracer, TracerBuilder};
