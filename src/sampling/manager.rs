// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Sampling strategy advertised by a remote strategy source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingStrategyResponse {
    #[serde(default)]
    pub probabilistic_sampling: Option<ProbabilisticSamplingStrategy>,
    #[serde(default)]
    pub rate_limiting_sampling: Option<RateLimitingSamplingStrategy>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbabilisticSamplingStrategy {
    pub sampling_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitingSamplingStrategy {
    pub max_traces_per_second: i64,
}

/// Remote source of sampling strategies, polled by the
/// [`RemoteControlledSampler`](crate::sampling::RemoteControlledSampler).
pub trait SamplingManager: Send + Sync {
    fn sampling_strategy(&self, service_name: &str) -> Result<SamplingStrategyResponse>;
}

/// Queries `http://{host_port}/sampling?service={name}` for a JSON strategy.
pub struct HttpSamplingManager {
    host_port: String,
    client: reqwest::blocking::Client,
}

impl HttpSamplingManager {
    pub const DEFAULT_HOST_PORT: &'static str = "localhost:5778";

    pub fn new(host_port: impl Into<String>) -> Self {
        HttpSamplingManager {
            host_port: host_port.into(),
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
        }
    }

    pub fn host_port(&self) -> &str {
        &self.host_port
    }
}

impl Default for HttpSamplingManager {
    fn default() -> Self {
        HttpSamplingManager::new(Self::DEFAULT_HOST_PORT)
    }
}

impl SamplingManager for HttpSamplingManager {
    fn sampling_strategy(&self, service_name: &str) -> Result<SamplingStrategyResponse> {
        let url = format!("http://{}/sampling", self.host_port);
        self.client
            .get(url)
            .query(&[("service", service_name)])
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| Error::SamplingStrategy(e.to_string()))?
            .json()
            .map_err(|e| Error::SamplingStrategy(e.to_string()))
    }
}
