// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

//! Transport boundary of the reporting pipeline.
//!
//! Concrete transports (UDP agent, HTTP collector) live outside this crate;
//! they plug in through [`SenderFactory`] registrations and are picked by
//! [`resolve`] from the trigger fields of a
//! [`SenderConfiguration`](crate::config::SenderConfiguration).

use std::sync::{Arc, Mutex};

use crate::config::SenderConfiguration;
use crate::error::Result;
use crate::tracer::Span;
use crate::{jg_debug, jg_warn};

/// Transport mechanism used by a reporter to deliver spans.
pub trait Sender: Send + Sync {
    /// Takes a span into the sender's buffer. Returns the number of spans
    /// shipped out as a side effect of the append.
    fn append(&self, span: Span) -> Result<usize>;

    /// Ships all buffered spans, returning how many were sent.
    fn flush(&self) -> Result<usize>;

    fn close(&self) -> Result<()>;
}

/// Sender that silently discards everything; the fallback when no transport
/// was configured.
pub struct NoopSender;

impl Sender for NoopSender {
    fn append(&self, _span: Span) -> Result<usize> {
        Ok(0)
    }

    fn flush(&self) -> Result<usize> {
        Ok(0)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Builds a concrete sender from the trigger fields of a
/// `SenderConfiguration` (endpoint, agent host/port, auth).
pub trait SenderFactory: Send + Sync {
    /// The selector this factory answers to, matched against the
    /// `JAEGER_SENDER_FACTORY` property.
    fn kind(&self) -> &'static str;

    fn build(&self, config: &SenderConfiguration) -> Arc<dyn Sender>;
}

static FACTORIES: Mutex<Vec<Arc<dyn SenderFactory>>> = Mutex::new(Vec::new());

/// Adds a sender factory to the process-wide registry.
pub fn register_sender_factory(factory: Arc<dyn SenderFactory>) {
    FACTORIES.lock().unwrap().push(factory);
}

/// Resolves a sender from the registered factories: the one matching the
/// configured selector, else a sole registered factory, else a no-op sender.
pub fn resolve(config: &SenderConfiguration) -> Arc<dyn Sender> {
    resolve_with(&FACTORIES.lock().unwrap(), config)
}

fn resolve_with(
    factories: &[Arc<dyn SenderFactory>],
    config: &SenderConfiguration,
) -> Arc<dyn Sender> {
    let chosen = match config.sender_factory() {
        Some(selector) => factories.iter().find(|f| f.kind() == selector),
        None if factories.len() == 1 => factories.first(),
        None => None,
    };

    match chosen {
        Some(factory) => {
            jg_debug!("Resolving sender through factory '{}'", factory.kind());
            factory.build(config)
        }
        None => {
            if factories.is_empty() {
                jg_warn!("No sender factories registered, spans will not be reported");
            } else {
                jg_warn!(
                    "{} sender factories registered but none selected, spans will not be reported",
                    factories.len()
                );
            }
            Arc::new(NoopSender)
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Mutex;

    use super::*;

    /// Buffering sender for pipeline tests: `append` parks spans, `flush`
    /// moves them into the shipped list.
    #[derive(Default)]
    pub(crate) struct InMemorySender {
        pub buffered: Mutex<Vec<Span>>,
        pub shipped: Mutex<Vec<Span>>,
        pub closed: Mutex<bool>,
    }

    impl Sender for InMemorySender {
        fn append(&self, span: Span) -> Result<usize> {
            self.buffered.lock().unwrap().push(span);
            Ok(0)
        }

        fn flush(&self) -> Result<usize> {
            let mut buffered = self.buffered.lock().unwrap();
            let count = buffered.len();
            self.shipped.lock().unwrap().append(&mut buffered);
            Ok(count)
        }

        fn close(&self) -> Result<()> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }
}
