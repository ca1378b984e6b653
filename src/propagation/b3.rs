// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

use crate::jg_debug;
use crate::propagation::{Codec, Extractor, Injector, SpanContext, FLAG_DEBUG, FLAG_SAMPLED};

pub const B3_TRACE_ID_KEY: &str = "x-b3-traceid";
pub const B3_SPAN_ID_KEY: &str = "x-b3-spanid";
pub const B3_PARENT_ID_KEY: &str = "x-b3-parentspanid";
pub const B3_SAMPLED_KEY: &str = "x-b3-sampled";
pub const B3_FLAGS_KEY: &str = "x-b3-flags";

/// Zipkin B3 multi-header codec. Only trace identity and sampling flags are
/// carried; baggage is not part of the B3 contract.
#[derive(Debug, Default)]
pub struct B3TextMapCodec;

impl Codec for B3TextMapCodec {
    fn inject(&self, context: &SpanContext, carrier: &mut dyn Injector) {
        carrier.set(B3_TRACE_ID_KEY, format!("{:032x}", context.trace_id));
        carrier.set(B3_SPAN_ID_KEY, format!("{:016x}", context.span_id));
        if context.parent_id != 0 {
            carrier.set(B3_PARENT_ID_KEY, format!("{:016x}", context.parent_id));
        }
        if context.is_debug() {
            // Debug implies a forced sampling decision, the sampled header
            // is redundant in that case.
            carrier.set(B3_FLAGS_KEY, "1".to_string());
        } else {
            carrier.set(
                B3_SAMPLED_KEY,
                if context.is_sampled() { "1" } else { "0" }.to_string(),
            );
        }
    }

    fn extract(&self, carrier: &dyn Extractor) -> Option<SpanContext> {
        let trace_id = parse_hex_u128(carrier.get(B3_TRACE_ID_KEY)?)?;
        let span_id = parse_hex_u64(carrier.get(B3_SPAN_ID_KEY)?)?;
        let parent_id = match carrier.get(B3_PARENT_ID_KEY) {
            Some(value) => parse_hex_u64(value)?,
            None => 0,
        };

        let mut flags = 0;
        if carrier.get(B3_SAMPLED_KEY) == Some("1") {
            flags |= FLAG_SAMPLED;
        }
        if carrier.get(B3_FLAGS_KEY) == Some("1") {
            flags |= FLAG_SAMPLED | FLAG_DEBUG;
        }

        Some(SpanContext::new(trace_id, span_id, parent_id, flags))
    }
}

fn parse_hex_u128(value: &str) -> Option<u128> {
    match u128::from_str_radix(value, 16) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            jg_debug!("Malformed b3 hex id '{value}'");
            None
        }
    }
}

fn parse_hex_u64(value: &str) -> Option<u64> {
    match u64::from_str_radix(value, 16) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            jg_debug!("Malformed b3 hex id '{value}'");
            None
        }
    }
}
