// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

//! Span delivery: the remote pipeline plus logging and composite reporters.

use std::fmt;

mod remote;

pub use remote::{RemoteReporter, RemoteReporterBuilder};

use crate::jg_info;
use crate::tracer::Span;

/// Delivers finished spans to a backend.
pub trait Reporter: Send + Sync + fmt::Debug {
    fn report(&self, span: Span);

    /// Flush and release resources. Must be safe to call more than once.
    fn close(&self);
}

/// Writes every reported span to the library log, synchronously.
#[derive(Debug, Default)]
pub struct LoggingReporter;

impl Reporter for LoggingReporter {
    fn report(&self, span: Span) {
        jg_info!("Span reported: {span:?}");
    }

    fn close(&self) {}
}

/// Forwards every report and close to all children, in order, without
/// letting one child's failure starve another.
pub struct CompositeReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl CompositeReporter {
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Self {
        CompositeReporter { reporters }
    }
}

impl Reporter for CompositeReporter {
    fn report(&self, span: Span) {
        for reporter in &self.reporters {
            reporter.report(span.clone());
        }
    }

    fn close(&self) {
        for reporter in &self.reporters {
            reporter.close();
        }
    }
}

impl fmt::Debug for CompositeReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.reporters.iter()).finish()
    }
}
