// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const FLAG_SAMPLED: u8 = 1;
pub const FLAG_DEBUG: u8 = 2;

/// The propagated identity of a trace: ids, sampling flags and baggage.
///
/// This is only the payload codecs move across process boundaries; the span
/// model itself lives with the tracer's collaborators.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: u128,
    pub span_id: u64,
    pub parent_id: u64,
    pub flags: u8,
    pub baggage: HashMap<String, String>,
}

impl SpanContext {
    pub fn new(trace_id: u128, span_id: u64, parent_id: u64, flags: u8) -> Self {
        SpanContext {
            trace_id,
            span_id,
            parent_id,
            flags,
            baggage: HashMap::new(),
        }
    }

    pub fn is_sampled(&self) -> bool {
        self.flags & FLAG_SAMPLED == FLAG_SAMPLED
    }

    pub fn is_debug(&self) -> bool {
        self.flags & FLAG_DEBUG == FLAG_DEBUG
    }

    pub fn with_baggage_item(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.baggage.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for SpanContext {
    /// `{trace-id}:{span-id}:{parent-id}:{flags}`, all lower-case hex.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:x}:{:x}:{:x}:{:x}",
            self.trace_id, self.span_id, self.parent_id, self.flags
        )
    }
}

impl FromStr for SpanContext {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(trace_id), Some(span_id), Some(parent_id), Some(flags), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err("context string should have 4 colon separated parts");
        };

        Ok(SpanContext::new(
            u128::from_str_radix(trace_id, 16).map_err(|_| "malformed trace id")?,
            u64::from_str_radix(span_id, 16).map_err(|_| "malformed span id")?,
            u64::from_str_radix(parent_id, 16).map_err(|_| "malformed parent id")?,
            u8::from_str_radix(flags, 16).map_err(|_| "malformed flags")?,
        ))
    }
}
