// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

//! Sampling strategies and the remote strategy poller.

use std::collections::HashMap;
use std::fmt;

mod manager;
mod probabilistic;
mod rate_limiting;
mod remote;

pub use manager::{
    HttpSamplingManager, ProbabilisticSamplingStrategy, RateLimitingSamplingStrategy,
    SamplingManager, SamplingStrategyResponse,
};
pub use probabilistic::ProbabilisticSampler;
pub use rate_limiting::RateLimitingSampler;
pub use remote::{RemoteControlledSampler, RemoteControlledSamplerBuilder};

pub const SAMPLER_TYPE_TAG_KEY: &str = "sampler.type";
pub const SAMPLER_PARAM_TAG_KEY: &str = "sampler.param";

/// The outcome of a sampling decision, carrying the tags describing which
/// sampler produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingStatus {
    pub sampled: bool,
    pub tags: HashMap<String, String>,
}

impl SamplingStatus {
    fn of(sampled: bool, sampler_type: &str, param: impl ToString) -> Self {
        SamplingStatus {
            sampled,
            tags: HashMap::from([
                (SAMPLER_TYPE_TAG_KEY.to_string(), sampler_type.to_string()),
                (SAMPLER_PARAM_TAG_KEY.to_string(), param.to_string()),
            ]),
        }
    }
}

/// Decides whether a given trace is recorded.
pub trait Sampler: Send + Sync + fmt::Debug {
    fn is_sampled(&self, trace_id: u128, operation: &str) -> SamplingStatus;

    /// Release any background resources. Default is a no-op.
    fn close(&self) {}
}

/// Samples every trace, or none.
pub struct ConstSampler {
    decision: bool,
}

impl ConstSampler {
    pub const TYPE: &'static str = "const";

    pub fn new(decision: bool) -> Self {
        ConstSampler { decision }
    }
}

impl Sampler for ConstSampler {
    fn is_sampled(&self, _trace_id: u128, _operation: &str) -> SamplingStatus {
        SamplingStatus::of(self.decision, Self::TYPE, self.decision)
    }
}

impl fmt::Debug for ConstSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstSampler")
            .field("decision", &self.decision)
            .finish()
    }
}
