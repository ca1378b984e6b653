// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

//! Trace context propagation: carriers, wire formats and codecs.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod carrier;
mod b3;
mod context;
mod textmap;

pub use b3::B3TextMapCodec;
pub use carrier::{Extractor, Injector};
pub use context::{SpanContext, FLAG_DEBUG, FLAG_SAMPLED};
pub use textmap::TextMapCodec;

/// The carrier shapes a tracer can inject into and extract from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// HTTP header maps; values may need URL escaping.
    HttpHeaders,
    /// Generic string key/value maps.
    TextMap,
}

/// The supported trace context propagation formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    /// The default Jaeger trace context propagation format.
    Jaeger,
    /// The Zipkin B3 trace context propagation format.
    B3,
}

impl FromStr for Propagation {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("jaeger") {
            Ok(Propagation::Jaeger)
        } else if s.eq_ignore_ascii_case("b3") {
            Ok(Propagation::B3)
        } else {
            Err("propagation format should be one of JAEGER, B3")
        }
    }
}

/// Encodes and decodes a [`SpanContext`] over a text carrier.
pub trait Codec: Send + Sync + fmt::Debug {
    fn inject(&self, context: &SpanContext, carrier: &mut dyn Injector);

    fn extract(&self, carrier: &dyn Extractor) -> Option<SpanContext>;
}

/// Fans a list of codecs out over one wire format.
///
/// Injection writes through every child in declared order; extraction
/// returns the first child's successful result, with no merging.
pub struct CompositeCodec {
    codecs: Vec<Arc<dyn Codec>>,
}

impl CompositeCodec {
    pub fn new(codecs: Vec<Arc<dyn Codec>>) -> Self {
        CompositeCodec { codecs }
    }
}

impl Codec for CompositeCodec {
    fn inject(&self, context: &SpanContext, carrier: &mut dyn Injector) {
        for codec in &self.codecs {
            codec.inject(context, carrier);
        }
    }

    fn extract(&self, carrier: &dyn Extractor) -> Option<SpanContext> {
        self.codecs.iter().find_map(|codec| codec.extract(carrier))
    }
}

impl fmt::Debug for CompositeCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.codecs.iter()).finish()
    }
}
