// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::error::{Error, Result};
use crate::sampling::{Sampler, SamplingStatus};

const KNUTH_FACTOR: u64 = 1_111_111_111_111_111_111;

/// Keeps (100 * `sampling_rate`)% of the traces, decided deterministically
/// from the low 64 bits of the trace id.
pub struct ProbabilisticSampler {
    sampling_rate: f64,
    sampling_id_threshold: u64,
}

impl ProbabilisticSampler {
    pub const TYPE: &'static str = "probabilistic";
    pub const DEFAULT_SAMPLING_PROBABILITY: f64 = 0.001;

    pub fn new(sampling_rate: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&sampling_rate) {
            return Err(Error::InvalidSamplingRate(sampling_rate));
        }
        Ok(ProbabilisticSampler {
            sampling_rate,
            sampling_id_threshold: Self::calculate_threshold(sampling_rate),
        })
    }

    fn calculate_threshold(rate: f64) -> u64 {
        if rate >= 1.0 {
            u64::MAX
        } else {
            (rate * (u64::MAX as f64)) as u64
        }
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }
}

impl Sampler for ProbabilisticSampler {
    fn is_sampled(&self, trace_id: u128, _operation: &str) -> SamplingStatus {
        let sampled = if self.sampling_rate <= 0.0 {
            false
        } else if self.sampling_rate >= 1.0 {
            true
        } else {
            let hashed_id = (trace_id as u64).wrapping_mul(KNUTH_FACTOR);
            hashed_id <= self.sampling_id_threshold
        };

        SamplingStatus::of(sampled, Self::TYPE, self.sampling_rate)
    }
}

impl fmt::Debug for ProbabilisticSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbabilisticSampler")
            .field("sampling_rate", &self.sampling_rate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{SAMPLER_PARAM_TAG_KEY, SAMPLER_TYPE_TAG_KEY};

    #[test]
    fn test_rate_bounds() {
        assert!(ProbabilisticSampler::new(-0.1).is_err());
        assert!(ProbabilisticSampler::new(1.1).is_err());
        assert!(ProbabilisticSampler::new(0.0).is_ok());
        assert!(ProbabilisticSampler::new(1.0).is_ok());
    }

    #[test]
    fn test_extreme_rates() {
        let never = ProbabilisticSampler::new(0.0).unwrap();
        let always = ProbabilisticSampler::new(1.0).unwrap();

        for trace_id in [0u128, 1, u64::MAX as u128, u128::MAX] {
            assert!(!never.is_sampled(trace_id, "op").sampled);
            assert!(always.is_sampled(trace_id, "op").sampled);
        }
    }

    #[test]
    fn test_threshold_decision() {
        let sampler = ProbabilisticSampler::new(0.5).unwrap();

        // A zero trace id hashes to zero, always below a positive threshold.
        assert!(sampler.is_sampled(0, "op").sampled);

        // Exhaustively proven counterpart: 0xffff hashes above 0.5 * u64::MAX.
        let hashed = 0xffffu64.wrapping_mul(KNUTH_FACTOR);
        assert!(hashed > sampler.sampling_id_threshold);
        assert!(!sampler.is_sampled(0xffff, "op").sampled);
    }

    #[test]
    fn test_status_tags() {
        let sampler = ProbabilisticSampler::new(0.5).unwrap();
        let status = sampler.is_sampled(0, "op");
        assert_eq!(status.tags[SAMPLER_TYPE_TAG_KEY], "probabilistic");
        assert_eq!(status.tags[SAMPLER_PARAM_TAG_KEY], "0.5");
    }
}
