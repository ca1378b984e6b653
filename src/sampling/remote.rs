// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::metrics::Metrics;
use crate::sampling::{
    HttpSamplingManager, ProbabilisticSampler, RateLimitingSampler, Sampler, SamplingManager,
    SamplingStatus, SamplingStrategyResponse,
};
use crate::{jg_debug, jg_warn};

pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(60);

/// Sampler that periodically refreshes its delegate from a remote strategy
/// source. Decisions are taken by the current delegate; poll outcomes are
/// reported through the metrics sink.
pub struct RemoteControlledSampler {
    delegate: Arc<RwLock<Box<dyn Sampler>>>,
    // (stop requested, condvar to wake the poller early on close)
    shutdown: Arc<(Mutex<bool>, Condvar)>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteControlledSampler {
    pub const TYPE: &'static str = "remote";

    pub fn builder(service_name: impl Into<String>) -> RemoteControlledSamplerBuilder {
        RemoteControlledSamplerBuilder {
            service_name: service_name.into(),
            manager: None,
            initial_sampler: None,
            metrics: None,
            polling_interval: DEFAULT_POLLING_INTERVAL,
        }
    }

    fn poll_loop(
        service_name: &str,
        manager: &dyn SamplingManager,
        delegate: &RwLock<Box<dyn Sampler>>,
        metrics: &Metrics,
        shutdown: &(Mutex<bool>, Condvar),
        interval: Duration,
    ) {
        let (stop, wakeup) = shutdown;
        loop {
            // Wait out a full interval before each poll so that short-lived
            // configurations never touch the network.
            let mut stopped = stop.lock().unwrap();
            while !*stopped {
                let (guard, timeout) = wakeup.wait_timeout(stopped, interval).unwrap();
                stopped = guard;
                if timeout.timed_out() {
                    break;
                }
            }
            if *stopped {
                return;
            }
            drop(stopped);

            match manager.sampling_strategy(service_name) {
                Ok(strategy) => {
                    metrics.sampler_retrieved.inc(1);
                    Self::update_sampler(delegate, &strategy, metrics);
                }
                Err(e) => {
                    metrics.sampler_query_failure.inc(1);
                    jg_debug!("Unable to fetch sampling strategy: {e}");
                }
            }
        }
    }

    fn update_sampler(
        delegate: &RwLock<Box<dyn Sampler>>,
        strategy: &SamplingStrategyResponse,
        metrics: &Metrics,
    ) {
        let replacement: Option<Box<dyn Sampler>> =
            if let Some(probabilistic) = &strategy.probabilistic_sampling {
                match ProbabilisticSampler::new(probabilistic.sampling_rate) {
                    Ok(sampler) => Some(Box::new(sampler)),
                    Err(e) => {
                        jg_warn!("Discarding remote sampling strategy: {e}");
                        None
                    }
                }
            } else if let Some(rate_limiting) = &strategy.rate_limiting_sampling {
                Some(Box::new(RateLimitingSampler::new(
                    rate_limiting.max_traces_per_second,
                )))
            } else {
                jg_warn!("Remote sampling strategy carries no known strategy type");
                None
            };

        if let Some(sampler) = replacement {
            *delegate.write().unwrap() = sampler;
            metrics.sampler_updated.inc(1);
        }
    }
}

impl Sampler for RemoteControlledSampler {
    fn is_sampled(&self, trace_id: u128, operation: &str) -> SamplingStatus {
        self.delegate.read().unwrap().is_sampled(trace_id, operation)
    }

    fn close(&self) {
        let (stop, wakeup) = &*self.shutdown;
        *stop.lock().unwrap() = true;
        wakeup.notify_all();
        if let Some(handle) = self.poller.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

impl fmt::Debug for RemoteControlledSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteControlledSampler")
            .field("delegate", &*self.delegate.read().unwrap())
            .finish()
    }
}

pub struct RemoteControlledSamplerBuilder {
    service_name: String,
    manager: Option<Box<dyn SamplingManager>>,
    initial_sampler: Option<Box<dyn Sampler>>,
    metrics: Option<Metrics>,
    polling_interval: Duration,
}

impl RemoteControlledSamplerBuilder {
    pub fn with_sampling_manager(mut self, manager: Box<dyn SamplingManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn with_initial_sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.initial_sampler = Some(sampler);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    pub fn build(self) -> RemoteControlledSampler {
        let manager: Box<dyn SamplingManager> = self
            .manager
            .unwrap_or_else(|| Box::new(HttpSamplingManager::default()));
        let initial: Box<dyn Sampler> = self.initial_sampler.unwrap_or_else(|| {
            Box::new(
                ProbabilisticSampler::new(ProbabilisticSampler::DEFAULT_SAMPLING_PROBABILITY)
                    .expect("default probability is in range"),
            )
        });
        let metrics = self.metrics.unwrap_or_else(Metrics::noop);

        let delegate = Arc::new(RwLock::new(initial));
        let shutdown = Arc::new((Mutex::new(false), Condvar::new()));

        let poller = {
            let service_name = self.service_name;
            let delegate = delegate.clone();
            let shutdown = shutdown.clone();
            let interval = self.polling_interval;
            std::thread::Builder::new()
                .name("jaeger-sampler-poll".to_string())
                .spawn(move || {
                    RemoteControlledSampler::poll_loop(
                        &service_name,
                        manager.as_ref(),
                        &delegate,
                        &metrics,
                        &shutdown,
                        interval,
                    )
                })
                .expect("failed to spawn sampler poll thread")
        };

        RemoteControlledSampler {
            delegate,
            shutdown,
            poller: Mutex::new(Some(poller)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::Error;
    use crate::metrics::InMemoryMetricsFactory;
    use crate::sampling::{ProbabilisticSamplingStrategy, SAMPLER_TYPE_TAG_KEY};

    struct FixedManager {
        polls: Arc<AtomicUsize>,
        response: Result<SamplingStrategyResponse, ()>,
    }

    impl SamplingManager for FixedManager {
        fn sampling_strategy(
            &self,
            _service_name: &str,
        ) -> crate::Result<SamplingStrategyResponse> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.response
                .clone()
                .map_err(|()| Error::SamplingStrategy("boom".to_string()))
        }
    }

    #[test]
    fn test_delegates_to_initial_sampler() {
        let sampler = RemoteControlledSampler::builder("svc")
            .with_sampling_manager(Box::new(FixedManager {
                polls: Arc::new(AtomicUsize::new(0)),
                response: Err(()),
            }))
            .build();

        let status = sampler.is_sampled(0, "op");
        assert_eq!(status.tags[SAMPLER_TYPE_TAG_KEY], "probabilistic");
        sampler.close();
    }

    #[test]
    fn test_close_before_first_poll_skips_network() {
        let polls = Arc::new(AtomicUsize::new(0));
        let sampler = RemoteControlledSampler::builder("svc")
            .with_sampling_manager(Box::new(FixedManager {
                polls: polls.clone(),
                response: Err(()),
            }))
            .build();

        sampler.close();
        assert_eq!(polls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_poll_updates_delegate_and_metrics() {
        let factory = InMemoryMetricsFactory::new();
        let polls = Arc::new(AtomicUsize::new(0));
        let sampler = RemoteControlledSampler::builder("svc")
            .with_sampling_manager(Box::new(FixedManager {
                polls: polls.clone(),
                response: Ok(SamplingStrategyResponse {
                    probabilistic_sampling: Some(ProbabilisticSamplingStrategy {
                        sampling_rate: 1.0,
                    }),
                    rate_limiting_sampling: None,
                }),
            }))
            .with_metrics(Metrics::new(&factory))
            .with_polling_interval(Duration::from_millis(10))
            .build();

        while polls.load(Ordering::SeqCst) == 0 {
            std::thread::sleep(Duration::from_millis(5));
        }
        sampler.close();

        assert!(factory.counter_value("jaeger.sampler-queries.ok") >= 1);
        assert!(factory.counter_value("jaeger.sampler-updates.ok") >= 1);
        assert!(sampler.is_sampled(u128::MAX, "op").sampled);
    }

    #[test]
    fn test_failed_poll_counts_query_failure() {
        let factory = InMemoryMetricsFactory::new();
        let polls = Arc::new(AtomicUsize::new(0));
        let sampler = RemoteControlledSampler::builder("svc")
            .with_sampling_manager(Box::new(FixedManager {
                polls: polls.clone(),
                response: Err(()),
            }))
            .with_metrics(Metrics::new(&factory))
            .with_polling_interval(Duration::from_millis(10))
            .build();

        while polls.load(Ordering::SeqCst) == 0 {
            std::thread::sleep(Duration::from_millis(5));
        }
        sampler.close();

        assert!(factory.counter_value("jaeger.sampler-queries.err") >= 1);
        // The seeded delegate stays in place after a failed poll.
        assert_eq!(
            sampler.is_sampled(0, "op").tags[SAMPLER_TYPE_TAG_KEY],
            "probabilistic"
        );
    }
}
