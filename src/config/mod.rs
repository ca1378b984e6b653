// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

//! Environment driven tracer assembly.
//!
//! [`Configuration`] reads the `JAEGER_*` properties through a layered
//! [`PropertyResolver`], turns them into sampler, reporter and codec
//! sub-configurations and hands out a lazily built shared [`Tracer`].
//!
//! [`Tracer`]: crate::tracer::Tracer

mod configuration;
mod resolver;

pub use configuration::{
    CodecConfiguration, Configuration, ReporterConfiguration, SamplerConfiguration,
    SenderConfiguration, JAEGER_AGENT_HOST, JAEGER_AGENT_PORT, JAEGER_AUTH_TOKEN, JAEGER_ENDPOINT,
    JAEGER_PASSWORD, JAEGER_PROPAGATION, JAEGER_REPORTER_FLUSH_INTERVAL,
    JAEGER_REPORTER_LOG_SPANS, JAEGER_REPORTER_MAX_QUEUE_SIZE, JAEGER_SAMPLER_MANAGER_HOST_PORT,
    JAEGER_SAMPLER_PARAM, JAEGER_SAMPLER_TYPE, JAEGER_SENDER_FACTORY, JAEGER_SERVICE_NAME,
    JAEGER_TAGS, JAEGER_USER,
};
pub use resolver::{EnvSource, MapSource, PropertyResolver, PropertySource};
