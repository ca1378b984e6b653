// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

//! Metrics sink for the assembly subsystem.
//!
//! The tracer only ever talks to the narrow [`Counter`] / [`MetricsFactory`]
//! interfaces; a backend is installed either explicitly on the
//! `Configuration`, or process-wide through [`register_metrics_factory`]
//! (first registration wins, everything else falls back to no-op).

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, OnceLock,
    },
};

pub trait Counter: Send + Sync {
    fn inc(&self, delta: u64);
}

pub trait MetricsFactory: Send + Sync {
    fn counter(&self, name: &'static str) -> Arc<dyn Counter>;
}

/// The counters emitted by the reporting pipeline and the remote sampler.
#[derive(Clone)]
pub struct Metrics {
    pub reporter_success: Arc<dyn Counter>,
    pub reporter_failure: Arc<dyn Counter>,
    pub reporter_dropped: Arc<dyn Counter>,
    pub sampler_retrieved: Arc<dyn Counter>,
    pub sampler_updated: Arc<dyn Counter>,
    pub sampler_query_failure: Arc<dyn Counter>,
}

impl Metrics {
    pub fn new(factory: &dyn MetricsFactory) -> Self {
        Metrics {
            reporter_success: factory.counter("jaeger.reporter-spans.ok"),
            reporter_failure: factory.counter("jaeger.reporter-spans.err"),
            reporter_dropped: factory.counter("jaeger.reporter-spans.dropped"),
            sampler_retrieved: factory.counter("jaeger.sampler-queries.ok"),
            sampler_updated: factory.counter("jaeger.sampler-updates.ok"),
            sampler_query_failure: factory.counter("jaeger.sampler-queries.err"),
        }
    }

    pub fn noop() -> Self {
        Metrics::new(&NoopMetricsFactory)
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

struct NoopCounter;

impl Counter for NoopCounter {
    fn inc(&self, _delta: u64) {}
}

pub struct NoopMetricsFactory;

impl MetricsFactory for NoopMetricsFactory {
    fn counter(&self, _name: &'static str) -> Arc<dyn Counter> {
        Arc::new(NoopCounter)
    }
}

struct InMemoryCounter(Arc<AtomicU64>);

impl Counter for InMemoryCounter {
    fn inc(&self, delta: u64) {
        self.0.fetch_add(delta, Ordering::Relaxed);
    }
}

/// Counter backend that keeps values in process memory, inspectable by name.
#[derive(Default)]
pub struct InMemoryMetricsFactory {
    counters: Mutex<HashMap<&'static str, Arc<AtomicU64>>>,
}

impl InMemoryMetricsFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of the named counter, 0 if it was never created.
    pub fn counter_value(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .unwrap()
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }
}

impl MetricsFactory for InMemoryMetricsFactory {
    fn counter(&self, name: &'static str) -> Arc<dyn Counter> {
        let cell = self
            .counters
            .lock()
            .unwrap()
            .entry(name)
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone();
        Arc::new(InMemoryCounter(cell))
    }
}

static REGISTERED_FACTORY: OnceLock<Arc<dyn MetricsFactory>> = OnceLock::new();

/// Installs a process-wide metrics factory. The first registration wins;
/// returns false when a factory was already registered.
pub fn register_metrics_factory(factory: Arc<dyn MetricsFactory>) -> bool {
    REGISTERED_FACTORY.set(factory).is_ok()
}

pub(crate) fn load_metrics_factory() -> Arc<dyn MetricsFactory> {
    match REGISTERED_FACTORY.get() {
        Some(factory) => factory.clone(),
        None => Arc::new(NoopMetricsFactory),
    }
}
