// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::jg_error;
use crate::metrics::Metrics;
use crate::reporter::Reporter;
use crate::sender::Sender;
use crate::tracer::Span;

enum Command {
    Report(Span),
    Flush,
    Close,
}

/// Reporter that hands spans to a background worker over a bounded queue;
/// the worker appends them to the sender and flushes on a fixed interval.
/// A full queue drops the span instead of blocking the caller.
pub struct RemoteReporter {
    commands: SyncSender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
    metrics: Metrics,
}

impl RemoteReporter {
    pub const DEFAULT_MAX_QUEUE_SIZE: usize = 100;
    pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);

    pub fn builder() -> RemoteReporterBuilder {
        RemoteReporterBuilder {
            sender: None,
            metrics: None,
            max_queue_size: Self::DEFAULT_MAX_QUEUE_SIZE,
            flush_interval: Self::DEFAULT_FLUSH_INTERVAL,
        }
    }

    /// Ask the worker to flush out-of-cycle. Best effort: a full queue
    /// means shipping is already behind anyway.
    pub fn flush(&self) {
        let _ = self.commands.try_send(Command::Flush);
    }

    fn run_worker(
        sender: &dyn Sender,
        commands: &mpsc::Receiver<Command>,
        metrics: &Metrics,
        flush_interval: Duration,
    ) {
        loop {
            match commands.recv_timeout(flush_interval) {
                Ok(Command::Report(span)) => match sender.append(span) {
                    Ok(shipped) => {
                        if shipped > 0 {
                            metrics.reporter_success.inc(shipped as u64);
                        }
                    }
                    Err(e) => {
                        metrics.reporter_failure.inc(1);
                        jg_error!("Unable to append span to sender: {e}");
                    }
                },
                Ok(Command::Flush) | Err(RecvTimeoutError::Timeout) => {
                    Self::flush_sender(sender, metrics);
                }
                Ok(Command::Close) | Err(RecvTimeoutError::Disconnected) => {
                    Self::flush_sender(sender, metrics);
                    if let Err(e) = sender.close() {
                        jg_error!("Unable to close sender: {e}");
                    }
                    return;
                }
            }
        }
    }

    fn flush_sender(sender: &dyn Sender, metrics: &Metrics) {
        match sender.flush() {
            Ok(shipped) => {
                if shipped > 0 {
                    metrics.reporter_success.inc(shipped as u64);
                }
            }
            Err(e) => {
                metrics.reporter_failure.inc(1);
                jg_error!("Unable to flush sender: {e}");
            }
        }
    }
}

impl Reporter for RemoteReporter {
    fn report(&self, span: Span) {
        match self.commands.try_send(Command::Report(span)) {
            Ok(()) => {}
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.metrics.reporter_dropped.inc(1);
            }
        }
    }

    fn close(&self) {
        // Blocking send: close must queue up behind every span already
        // accepted, so nothing accepted before close is lost.
        let _ = self.commands.send(Command::Close);
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

impl fmt::Debug for RemoteReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteReporter").finish_non_exhaustive()
    }
}

pub struct RemoteReporterBuilder {
    sender: Option<Arc<dyn Sender>>,
    metrics: Option<Metrics>,
    max_queue_size: usize,
    flush_interval: Duration,
}

impl RemoteReporterBuilder {
    pub fn with_sender(mut self, sender: Arc<dyn Sender>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size.max(1);
        self
    }

    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    pub fn build(self) -> RemoteReporter {
        let sender: Arc<dyn Sender> = self
            .sender
            .unwrap_or_else(|| Arc::new(crate::sender::NoopSender));
        let metrics = self.metrics.unwrap_or_else(Metrics::noop);

        let (commands, receiver) = mpsc::sync_channel(self.max_queue_size);

        let worker = {
            let sender = sender.clone();
            let metrics = metrics.clone();
            let flush_interval = self.flush_interval;
            std::thread::Builder::new()
                .name("jaeger-reporter-flush".to_string())
                .spawn(move || {
                    RemoteReporter::run_worker(sender.as_ref(), &receiver, &metrics, flush_interval)
                })
                .expect("failed to spawn reporter flush thread")
        };

        RemoteReporter {
            commands,
            worker: Mutex::new(Some(worker)),
            metrics,
        }
    }
}
