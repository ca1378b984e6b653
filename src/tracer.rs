// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

//! The assembled tracer: sampler, reporter, metrics, tags and codecs wired
//! into one object.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::propagation::{Codec, Extractor, Format, Injector, SpanContext, TextMapCodec};
use crate::reporter::{LoggingReporter, Reporter};
use crate::sampling::{ConstSampler, Sampler, SamplingStatus};

pub const JAEGER_CLIENT_VERSION_TAG_KEY: &str = "jaeger.version";
pub const TRACER_HOSTNAME_TAG_KEY: &str = "hostname";

pub(crate) const CLIENT_VERSION: &str = concat!("rust-", env!("CARGO_PKG_VERSION"));

/// A finished unit of work, as handed to reporters and senders.
#[derive(Clone, Debug)]
pub struct Span {
    pub context: SpanContext,
    pub operation_name: String,
    pub tags: HashMap<String, String>,
    pub start_time: SystemTime,
    pub duration: Duration,
}

impl Span {
    pub fn new(context: SpanContext, operation_name: impl Into<String>) -> Self {
        Span {
            context,
            operation_name: operation_name.into(),
            tags: HashMap::new(),
            start_time: SystemTime::now(),
            duration: Duration::ZERO,
        }
    }
}

/// The root object issuing sampling decisions, propagating contexts and
/// delivering spans for one service.
pub struct Tracer {
    service_name: String,
    sampler: Box<dyn Sampler>,
    reporter: Box<dyn Reporter>,
    metrics: Metrics,
    tags: HashMap<String, Option<String>>,
    injectors: HashMap<Format, Arc<dyn Codec>>,
    extractors: HashMap<Format, Arc<dyn Codec>>,
    closed: AtomicBool,
}

impl Tracer {
    pub fn builder(service_name: impl Into<String>) -> Result<TracerBuilder> {
        TracerBuilder::new(service_name)
    }

    /// Rejects null-equivalent and whitespace-only service names.
    pub fn check_valid_service_name(service_name: &str) -> Result<&str> {
        if service_name.trim().is_empty() {
            return Err(Error::InvalidServiceName);
        }
        Ok(service_name)
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The merged constant tags attached to every trace of this service.
    /// Values resolved from an unresolvable `${...}` reference are `None`.
    pub fn tags(&self) -> &HashMap<String, Option<String>> {
        &self.tags
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn is_sampled(&self, trace_id: u128, operation: &str) -> SamplingStatus {
        self.sampler.is_sampled(trace_id, operation)
    }

    pub fn inject(&self, context: &SpanContext, format: Format, carrier: &mut dyn Injector) {
        if let Some(codec) = self.injectors.get(&format) {
            codec.inject(context, carrier);
        }
    }

    pub fn extract(&self, format: Format, carrier: &dyn Extractor) -> Option<SpanContext> {
        self.extractors.get(&format)?.extract(carrier)
    }

    pub fn report(&self, span: Span) {
        self.reporter.report(span);
    }

    /// Shuts the reporting pipeline and the sampler down. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.reporter.close();
        self.sampler.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("service_name", &self.service_name)
            .field("sampler", &self.sampler)
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}

impl Drop for Tracer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Step-wise assembly of a [`Tracer`]. Both wire formats come pre-wired
/// with the plain jaeger text codecs; registrations replace them.
pub struct TracerBuilder {
    service_name: String,
    sampler: Option<Box<dyn Sampler>>,
    reporter: Option<Box<dyn Reporter>>,
    metrics: Option<Metrics>,
    tags: HashMap<String, Option<String>>,
    injectors: HashMap<Format, Arc<dyn Codec>>,
    extractors: HashMap<Format, Arc<dyn Codec>>,
}

impl TracerBuilder {
    pub fn new(service_name: impl Into<String>) -> Result<Self> {
        let service_name = service_name.into();
        Tracer::check_valid_service_name(&service_name)?;

        let header_codec: Arc<dyn Codec> = Arc::new(TextMapCodec::new(true));
        let text_codec: Arc<dyn Codec> = Arc::new(TextMapCodec::new(false));
        Ok(TracerBuilder {
            service_name,
            sampler: None,
            reporter: None,
            metrics: None,
            tags: HashMap::new(),
            injectors: HashMap::from([
                (Format::HttpHeaders, header_codec.clone()),
                (Format::TextMap, text_codec.clone()),
            ]),
            extractors: HashMap::from([
                (Format::HttpHeaders, header_codec),
                (Format::TextMap, text_codec),
            ]),
        })
    }

    pub fn with_sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_tags(mut self, tags: HashMap<String, Option<String>>) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), Some(value.into()));
        self
    }

    pub fn register_injector(&mut self, format: Format, codec: Arc<dyn Codec>) -> &mut Self {
        self.injectors.insert(format, codec);
        self
    }

    pub fn register_extractor(&mut self, format: Format, codec: Arc<dyn Codec>) -> &mut Self {
        self.extractors.insert(format, codec);
        self
    }

    pub fn build(self) -> Tracer {
        let mut tags = self.tags;
        tags.entry(JAEGER_CLIENT_VERSION_TAG_KEY.to_string())
            .or_insert_with(|| Some(CLIENT_VERSION.to_string()));
        if let Ok(hostname) = std::env::var("HOSTNAME") {
            tags.entry(TRACER_HOSTNAME_TAG_KEY.to_string())
                .or_insert(Some(hostname));
        }

        Tracer {
            service_name: self.service_name,
            sampler: self.sampler.unwrap_or_else(|| Box::new(ConstSampler::new(true))),
            reporter: self.reporter.unwrap_or_else(|| Box::new(LoggingReporter)),
            metrics: self.metrics.unwrap_or_else(Metrics::noop),
            tags,
            injectors: self.injectors,
            extractors: self.extractors,
            closed: AtomicBool::new(false),
        }
    }
}
