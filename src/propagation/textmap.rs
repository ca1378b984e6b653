// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::jg_debug;
use crate::propagation::{Codec, Extractor, Injector, SpanContext};

pub const TRACE_ID_KEY: &str = "uber-trace-id";
pub const BAGGAGE_KEY_PREFIX: &str = "uberctx-";

// URL-escape everything except characters that survive form encoding.
const URL_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The native Jaeger text codec: one `uber-trace-id` entry for the context
/// and one `uberctx-` prefixed entry per baggage item.
#[derive(Debug, Default)]
pub struct TextMapCodec {
    /// Escape values for HTTP header carriers; plain text maps leave
    /// values untouched.
    url_encoding: bool,
}

impl TextMapCodec {
    pub fn new(url_encoding: bool) -> Self {
        TextMapCodec { url_encoding }
    }

    fn encode_value<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.url_encoding {
            utf8_percent_encode(value, URL_ESCAPE).into()
        } else {
            Cow::Borrowed(value)
        }
    }

    fn decode_value<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.url_encoding {
            // Keep the raw value when the escape sequences are broken.
            percent_decode_str(value)
                .decode_utf8()
                .unwrap_or(Cow::Borrowed(value))
        } else {
            Cow::Borrowed(value)
        }
    }
}

impl Codec for TextMapCodec {
    fn inject(&self, context: &SpanContext, carrier: &mut dyn Injector) {
        carrier.set(
            TRACE_ID_KEY,
            self.encode_value(&context.to_string()).into_owned(),
        );
        for (key, value) in &context.baggage {
            carrier.set(
                &format!("{BAGGAGE_KEY_PREFIX}{key}"),
                self.encode_value(value).into_owned(),
            );
        }
    }

    fn extract(&self, carrier: &dyn Extractor) -> Option<SpanContext> {
        let encoded = carrier.get(TRACE_ID_KEY)?;
        let mut context: SpanContext = match self.decode_value(encoded).parse() {
            Ok(context) => context,
            Err(e) => {
                jg_debug!("Unable to decode {TRACE_ID_KEY} '{encoded}': {e}");
                return None;
            }
        };

        for key in carrier.keys() {
            if let Some(baggage_key) = key.to_lowercase().strip_prefix(BAGGAGE_KEY_PREFIX) {
                if let Some(value) = carrier.get(key) {
                    context.baggage.insert(
                        baggage_key.to_string(),
                        self.decode_value(value).into_owned(),
                    );
                }
            }
        }

        Some(context)
    }
}
