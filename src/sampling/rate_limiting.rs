// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::sync::Mutex;
use std::time::Instant;

use crate::sampling::{Sampler, SamplingStatus};

/// Token bucket capping the number of sampled traces per second.
pub struct RateLimitingSampler {
    max_traces_per_second: i64,
    inner: Mutex<BucketState>,
}

struct BucketState {
    balance: f64,
    max_balance: f64,
    last_tick: Instant,
}

impl RateLimitingSampler {
    pub const TYPE: &'static str = "ratelimiting";

    pub fn new(max_traces_per_second: i64) -> Self {
        // A cap below one trace per second still needs a usable bucket.
        let max_balance = (max_traces_per_second as f64).max(1.0);
        RateLimitingSampler {
            max_traces_per_second,
            inner: Mutex::new(BucketState {
                balance: max_balance,
                max_balance,
                last_tick: Instant::now(),
            }),
        }
    }

    fn check_credit(&self, cost: f64) -> bool {
        let mut state = self.inner.lock().unwrap();
        let now = Instant::now();

        let elapsed = now.duration_since(state.last_tick);
        state.last_tick = now;
        state.balance += elapsed.as_secs_f64() * self.max_traces_per_second as f64;
        if state.balance > state.max_balance {
            state.balance = state.max_balance;
        }

        if state.balance >= cost {
            state.balance -= cost;
            true
        } else {
            false
        }
    }
}

impl Sampler for RateLimitingSampler {
    fn is_sampled(&self, _trace_id: u128, _operation: &str) -> SamplingStatus {
        let sampled = self.check_credit(1.0);
        SamplingStatus::of(sampled, Self::TYPE, self.max_traces_per_second)
    }
}

impl fmt::Debug for RateLimitingSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitingSampler")
            .field("max_traces_per_second", &self.max_traces_per_second)
            .finish()
    }
}
