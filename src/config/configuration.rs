// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use crate::config::{EnvSource, MapSource, PropertyResolver};
use crate::error::{Error, Result};
use crate::jg_error;
use crate::metrics::{load_metrics_factory, Metrics, MetricsFactory};
use crate::propagation::{
    B3TextMapCodec, Codec, CompositeCodec, Format, Propagation, TextMapCodec,
};
use crate::reporter::{CompositeReporter, LoggingReporter, RemoteReporter, Reporter};
use crate::sampling::{
    ConstSampler, HttpSamplingManager, ProbabilisticSampler, RateLimitingSampler,
    RemoteControlledSampler, Sampler,
};
use crate::sender::{self, Sender};
use crate::tracer::{Tracer, TracerBuilder};

pub const JAEGER_SERVICE_NAME: &str = "JAEGER_SERVICE_NAME";
pub const JAEGER_SAMPLER_TYPE: &str = "JAEGER_SAMPLER_TYPE";
pub const JAEGER_SAMPLER_PARAM: &str = "JAEGER_SAMPLER_PARAM";
pub const JAEGER_SAMPLER_MANAGER_HOST_PORT: &str = "JAEGER_SAMPLER_MANAGER_HOST_PORT";
pub const JAEGER_REPORTER_LOG_SPANS: &str = "JAEGER_REPORTER_LOG_SPANS";
pub const JAEGER_REPORTER_MAX_QUEUE_SIZE: &str = "JAEGER_REPORTER_MAX_QUEUE_SIZE";
pub const JAEGER_REPORTER_FLUSH_INTERVAL: &str = "JAEGER_REPORTER_FLUSH_INTERVAL";
pub const JAEGER_AGENT_HOST: &str = "JAEGER_AGENT_HOST";
pub const JAEGER_AGENT_PORT: &str = "JAEGER_AGENT_PORT";
pub const JAEGER_ENDPOINT: &str = "JAEGER_ENDPOINT";
pub const JAEGER_AUTH_TOKEN: &str = "JAEGER_AUTH_TOKEN";
pub const JAEGER_USER: &str = "JAEGER_USER";
pub const JAEGER_PASSWORD: &str = "JAEGER_PASSWORD";
pub const JAEGER_TAGS: &str = "JAEGER_TAGS";
pub const JAEGER_PROPAGATION: &str = "JAEGER_PROPAGATION";
pub const JAEGER_SENDER_FACTORY: &str = "JAEGER_SENDER_FACTORY";

/// Assembles a [`Tracer`] out of the sub-configurations, either read from
/// the environment or set programmatically, and owns the resulting shared
/// instance. The tracer is built lazily on the first [`get_tracer`] call
/// and every later call returns the same instance.
///
/// [`get_tracer`]: Configuration::get_tracer
pub struct Configuration {
    service_name: String,
    sampler_config: Option<SamplerConfiguration>,
    reporter_config: Option<ReporterConfiguration>,
    codec_config: Option<CodecConfiguration>,
    metrics_factory: Option<Arc<dyn MetricsFactory>>,
    tracer_tags: HashMap<String, Option<String>>,
    tracer: OnceLock<Arc<Tracer>>,
    build_lock: Mutex<()>,
}

impl Configuration {
    pub fn new(service_name: impl Into<String>) -> Result<Self> {
        let service_name = service_name.into();
        Tracer::check_valid_service_name(&service_name)?;
        Ok(Configuration {
            service_name,
            sampler_config: None,
            reporter_config: None,
            codec_config: None,
            metrics_factory: None,
            tracer_tags: HashMap::new(),
            tracer: OnceLock::new(),
            build_lock: Mutex::new(()),
        })
    }

    /// Builds a configuration from the `JAEGER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_resolver(&PropertyResolver::new().add_source(Box::new(EnvSource)))
    }

    /// Builds a configuration from explicit properties, falling back to the
    /// environment for anything the map does not cover.
    pub fn from_properties<K, V>(properties: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_resolver(
            &PropertyResolver::new()
                .add_source(Box::new(MapSource::from_iter(properties)))
                .add_source(Box::new(EnvSource)),
        )
    }

    pub fn from_resolver(resolver: &PropertyResolver) -> Result<Self> {
        let mut config = Configuration::new(resolver.get(JAEGER_SERVICE_NAME).unwrap_or_default())?;
        config.sampler_config = Some(SamplerConfiguration::from_resolver(resolver));
        config.reporter_config = Some(ReporterConfiguration::from_resolver(resolver));
        config.codec_config = Some(CodecConfiguration::from_resolver(resolver));
        config.tracer_tags = resolver.get_tags(JAEGER_TAGS);
        Ok(config)
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Result<Self> {
        let service_name = service_name.into();
        Tracer::check_valid_service_name(&service_name)?;
        self.service_name = service_name;
        Ok(self)
    }

    pub fn with_sampler_configuration(mut self, sampler: SamplerConfiguration) -> Self {
        self.sampler_config = Some(sampler);
        self
    }

    pub fn with_reporter_configuration(mut self, reporter: ReporterConfiguration) -> Self {
        self.reporter_config = Some(reporter);
        self
    }

    pub fn with_codec_configuration(mut self, codec: CodecConfiguration) -> Self {
        self.codec_config = Some(codec);
        self
    }

    pub fn with_metrics_factory(mut self, factory: Arc<dyn MetricsFactory>) -> Self {
        self.metrics_factory = Some(factory);
        self
    }

    pub fn with_tracer_tags(mut self, tags: HashMap<String, Option<String>>) -> Self {
        self.tracer_tags.extend(tags);
        self
    }

    pub fn with_tracer_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tracer_tags.insert(key.into(), Some(value.into()));
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Assembles a fresh tracer builder from the current sub-configurations
    /// without touching the shared instance. Missing sub-configurations take
    /// their documented defaults; an explicit metrics factory beats the
    /// process-wide registered one.
    pub fn get_tracer_builder(&self) -> Result<TracerBuilder> {
        let metrics_factory = self
            .metrics_factory
            .clone()
            .unwrap_or_else(load_metrics_factory);
        let metrics = Metrics::new(metrics_factory.as_ref());

        let sampler = self
            .sampler_config
            .clone()
            .unwrap_or_default()
            .create_sampler(&self.service_name, &metrics)?;
        let reporter = self
            .reporter_config
            .clone()
            .unwrap_or_default()
            .reporter(&metrics);

        let mut builder = TracerBuilder::new(self.service_name.clone())?
            .with_sampler(sampler)
            .with_reporter(reporter)
            .with_metrics(metrics)
            .with_tags(self.tracer_tags.clone());
        self.codec_config
            .clone()
            .unwrap_or_default()
            .apply(&mut builder);
        Ok(builder)
    }

    /// The shared tracer, built on first use. Concurrent callers all get
    /// the same instance; a failed build leaves nothing cached so a later
    /// call can retry.
    pub fn get_tracer(&self) -> Result<Arc<Tracer>> {
        if let Some(tracer) = self.tracer.get() {
            return Ok(tracer.clone());
        }
        let _guard = self.build_lock.lock().unwrap();
        if let Some(tracer) = self.tracer.get() {
            return Ok(tracer.clone());
        }
        let tracer = Arc::new(self.get_tracer_builder()?.build());
        let _ = self.tracer.set(tracer.clone());
        Ok(tracer)
    }

    /// Closes the shared tracer if one was ever built. The instance stays
    /// cached, so later [`get_tracer`](Configuration::get_tracer) calls
    /// observe it in its closed state rather than building a new one.
    pub fn close_tracer(&self) {
        let _guard = self.build_lock.lock().unwrap();
        if let Some(tracer) = self.tracer.get() {
            tracer.close();
        }
    }
}

/// Which sampling strategy to use and how to parameterize it.
#[derive(Clone, Default)]
pub struct SamplerConfiguration {
    sampler_type: Option<String>,
    param: Option<f64>,
    manager_host_port: Option<String>,
}

impl SamplerConfiguration {
    pub fn from_resolver(resolver: &PropertyResolver) -> Self {
        SamplerConfiguration {
            sampler_type: resolver.get(JAEGER_SAMPLER_TYPE),
            param: resolver.get_number(JAEGER_SAMPLER_PARAM),
            manager_host_port: resolver.get(JAEGER_SAMPLER_MANAGER_HOST_PORT),
        }
    }

    pub fn with_type(mut self, sampler_type: impl Into<String>) -> Self {
        self.sampler_type = Some(sampler_type.into());
        self
    }

    pub fn with_param(mut self, param: f64) -> Self {
        self.param = Some(param);
        self
    }

    pub fn with_manager_host_port(mut self, host_port: impl Into<String>) -> Self {
        self.manager_host_port = Some(host_port.into());
        self
    }

    pub fn sampler_type(&self) -> Option<&str> {
        self.sampler_type.as_deref()
    }

    pub fn param(&self) -> Option<f64> {
        self.param
    }

    pub fn manager_host_port(&self) -> Option<&str> {
        self.manager_host_port.as_deref()
    }

    /// Instantiates the configured sampler. A missing or blank type means
    /// remote; a missing param means the default probability. An unknown
    /// type is fatal.
    pub(crate) fn create_sampler(
        &self,
        service_name: &str,
        metrics: &Metrics,
    ) -> Result<Box<dyn Sampler>> {
        let sampler_type = match self.sampler_type.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => RemoteControlledSampler::TYPE,
        };
        let param = self
            .param
            .unwrap_or(ProbabilisticSampler::DEFAULT_SAMPLING_PROBABILITY);

        match sampler_type {
            ConstSampler::TYPE => Ok(Box::new(ConstSampler::new(param as i64 != 0))),
            ProbabilisticSampler::TYPE => Ok(Box::new(ProbabilisticSampler::new(param)?)),
            RateLimitingSampler::TYPE => Ok(Box::new(RateLimitingSampler::new(param as i64))),
            RemoteControlledSampler::TYPE => {
                let host_port = self
                    .manager_host_port
                    .clone()
                    .unwrap_or_else(|| HttpSamplingManager::DEFAULT_HOST_PORT.to_string());
                Ok(Box::new(
                    RemoteControlledSampler::builder(service_name)
                        .with_sampling_manager(Box::new(HttpSamplingManager::new(host_port)))
                        .with_initial_sampler(Box::new(ProbabilisticSampler::new(param)?))
                        .with_metrics(metrics.clone())
                        .build(),
                ))
            }
            unknown => Err(Error::InvalidSamplingStrategy(unknown.to_string())),
        }
    }
}

/// How finished spans leave the process: queue sizing, flush cadence and
/// the sender transport underneath.
#[derive(Clone, Default)]
pub struct ReporterConfiguration {
    log_spans: Option<bool>,
    flush_interval_ms: Option<i64>,
    max_queue_size: Option<i64>,
    sender_configuration: SenderConfiguration,
}

impl ReporterConfiguration {
    pub fn from_resolver(resolver: &PropertyResolver) -> Self {
        ReporterConfiguration {
            log_spans: Some(resolver.get_bool(JAEGER_REPORTER_LOG_SPANS)),
            flush_interval_ms: resolver.get_int(JAEGER_REPORTER_FLUSH_INTERVAL),
            max_queue_size: resolver.get_int(JAEGER_REPORTER_MAX_QUEUE_SIZE),
            sender_configuration: SenderConfiguration::from_resolver(resolver),
        }
    }

    pub fn with_log_spans(mut self, log_spans: bool) -> Self {
        self.log_spans = Some(log_spans);
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_ms = Some(interval.as_millis() as i64);
        self
    }

    pub fn with_max_queue_size(mut self, max_queue_size: i64) -> Self {
        self.max_queue_size = Some(max_queue_size);
        self
    }

    pub fn with_sender_configuration(mut self, sender: SenderConfiguration) -> Self {
        self.sender_configuration = sender;
        self
    }

    pub fn sender_configuration(&self) -> &SenderConfiguration {
        &self.sender_configuration
    }

    pub(crate) fn reporter(&self, metrics: &Metrics) -> Box<dyn Reporter> {
        let mut builder = RemoteReporter::builder()
            .with_sender(self.sender_configuration.sender())
            .with_metrics(metrics.clone());
        if let Some(size) = self.max_queue_size {
            builder = builder.with_max_queue_size(size.max(1) as usize);
        }
        if let Some(ms) = self.flush_interval_ms {
            builder = builder.with_flush_interval(Duration::from_millis(ms.max(1) as u64));
        }
        let remote: Box<dyn Reporter> = Box::new(builder.build());

        if self.log_spans == Some(true) {
            Box::new(CompositeReporter::new(vec![
                remote,
                Box::new(LoggingReporter),
            ]))
        } else {
            remote
        }
    }
}

/// Trace context codecs, accumulated per wire format.
///
/// Several codecs registered for the same format are folded into a
/// [`CompositeCodec`] in registration order.
#[derive(Clone, Default)]
pub struct CodecConfiguration {
    codecs: HashMap<Format, Vec<Arc<dyn Codec>>>,
}

impl CodecConfiguration {
    /// Parses the comma-separated `JAEGER_PROPAGATION` list. Unknown
    /// formats are logged and skipped.
    pub fn from_resolver(resolver: &PropertyResolver) -> Self {
        let mut config = CodecConfiguration::default();
        let Some(raw) = resolver.get(JAEGER_PROPAGATION) else {
            return config;
        };
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.parse::<Propagation>() {
                Ok(Propagation::Jaeger) => {
                    config = config
                        .with_codec(Format::HttpHeaders, Arc::new(TextMapCodec::new(true)))
                        .with_codec(Format::TextMap, Arc::new(TextMapCodec::new(false)));
                }
                Ok(Propagation::B3) => {
                    let codec = Arc::new(B3TextMapCodec::default());
                    config = config
                        .with_codec(Format::HttpHeaders, codec.clone())
                        .with_codec(Format::TextMap, codec);
                }
                Err(_) => {
                    jg_error!("Unknown propagation format '{token}'");
                }
            }
        }
        config
    }

    pub fn with_codec(mut self, format: Format, codec: Arc<dyn Codec>) -> Self {
        self.codecs.entry(format).or_default().push(codec);
        self
    }

    pub fn codecs(&self) -> &HashMap<Format, Vec<Arc<dyn Codec>>> {
        &self.codecs
    }

    /// Installs the accumulated codecs on the builder, replacing its
    /// defaults for every format that has at least one codec.
    pub(crate) fn apply(&self, builder: &mut TracerBuilder) {
        for (format, codecs) in &self.codecs {
            let codec: Arc<dyn Codec> = match codecs.as_slice() {
                [] => continue,
                [only] => only.clone(),
                _ => Arc::new(CompositeCodec::new(codecs.clone())),
            };
            builder.register_injector(*format, codec.clone());
            builder.register_extractor(*format, codec);
        }
    }
}

/// Transport coordinates for span delivery. The trigger fields (agent
/// host/port, endpoint, auth) are interpreted by whatever sender factories
/// are registered; an explicitly supplied sender bypasses them all.
#[derive(Clone, Default)]
pub struct SenderConfiguration {
    sender: Option<Arc<dyn Sender>>,
    agent_host: Option<String>,
    agent_port: Option<i64>,
    endpoint: Option<String>,
    auth_token: Option<String>,
    auth_username: Option<String>,
    auth_password: Option<String>,
    sender_factory: Option<String>,
}

impl SenderConfiguration {
    pub fn from_resolver(resolver: &PropertyResolver) -> Self {
        SenderConfiguration {
            sender: None,
            agent_host: resolver.get(JAEGER_AGENT_HOST),
            agent_port: resolver.get_int(JAEGER_AGENT_PORT),
            endpoint: resolver.get(JAEGER_ENDPOINT),
            auth_token: resolver.get(JAEGER_AUTH_TOKEN),
            auth_username: resolver.get(JAEGER_USER),
            auth_password: resolver.get(JAEGER_PASSWORD),
            sender_factory: resolver.get(JAEGER_SENDER_FACTORY),
        }
    }

    pub fn with_sender(mut self, sender: Arc<dyn Sender>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_agent_host(mut self, host: impl Into<String>) -> Self {
        self.agent_host = Some(host.into());
        self
    }

    pub fn with_agent_port(mut self, port: i64) -> Self {
        self.agent_port = Some(port);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth_username = Some(username.into());
        self.auth_password = Some(password.into());
        self
    }

    pub fn with_sender_factory(mut self, selector: impl Into<String>) -> Self {
        self.sender_factory = Some(selector.into());
        self
    }

    pub fn agent_host(&self) -> Option<&str> {
        self.agent_host.as_deref()
    }

    pub fn agent_port(&self) -> Option<i64> {
        self.agent_port
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn auth_username(&self) -> Option<&str> {
        self.auth_username.as_deref()
    }

    pub fn auth_password(&self) -> Option<&str> {
        self.auth_password.as_deref()
    }

    pub fn sender_factory(&self) -> Option<&str> {
        self.sender_factory.as_deref()
    }

    /// The sender to report through: an explicitly supplied one takes
    /// precedence over factory resolution, no matter what the trigger
    /// fields hold.
    pub fn sender(&self) -> Arc<dyn Sender> {
        match &self.sender {
            Some(sender) => sender.clone(),
            None => sender::resolve(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as StdHashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::metrics::{Counter, InMemoryMetricsFactory};
    use crate::propagation::{Extractor, SpanContext, FLAG_SAMPLED};
    use crate::sampling::{SAMPLER_PARAM_TAG_KEY, SAMPLER_TYPE_TAG_KEY};
    use crate::sender::NoopSender;

    fn resolver(entries: &[(&str, &str)]) -> PropertyResolver {
        PropertyResolver::new().add_source(Box::new(MapSource::from_iter(
            entries.iter().copied(),
        )))
    }

    #[test]
    fn test_create_const_sampler() {
        let sampler = SamplerConfiguration::default()
            .with_type(ConstSampler::TYPE)
            .with_param(1.0)
            .create_sampler("svc", &Metrics::noop())
            .unwrap();

        let status = sampler.is_sampled(7, "op");
        assert!(status.sampled);
        assert_eq!(status.tags[SAMPLER_TYPE_TAG_KEY], "const");

        let off = SamplerConfiguration::default()
            .with_type(ConstSampler::TYPE)
            .with_param(0.0)
            .create_sampler("svc", &Metrics::noop())
            .unwrap();
        assert!(!off.is_sampled(7, "op").sampled);
    }

    #[test]
    fn test_create_probabilistic_sampler() {
        let sampler = SamplerConfiguration::default()
            .with_type(ProbabilisticSampler::TYPE)
            .with_param(0.25)
            .create_sampler("svc", &Metrics::noop())
            .unwrap();

        let status = sampler.is_sampled(0, "op");
        assert_eq!(status.tags[SAMPLER_TYPE_TAG_KEY], "probabilistic");
        assert_eq!(status.tags[SAMPLER_PARAM_TAG_KEY], "0.25");
    }

    #[test]
    fn test_create_rate_limiting_sampler() {
        let sampler = SamplerConfiguration::default()
            .with_type(RateLimitingSampler::TYPE)
            .with_param(2.0)
            .create_sampler("svc", &Metrics::noop())
            .unwrap();

        let status = sampler.is_sampled(0, "op");
        assert_eq!(status.tags[SAMPLER_TYPE_TAG_KEY], "ratelimiting");
        assert_eq!(status.tags[SAMPLER_PARAM_TAG_KEY], "2");
    }

    #[test]
    fn test_default_sampler_is_remote_with_default_probability() {
        let sampler = SamplerConfiguration::default()
            .create_sampler("svc", &Metrics::noop())
            .unwrap();

        // The remote sampler seeds a probabilistic delegate at the default
        // probability; the first poll is a full interval away so no
        // network is touched here.
        let status = sampler.is_sampled(0, "op");
        assert_eq!(status.tags[SAMPLER_TYPE_TAG_KEY], "probabilistic");
        assert_eq!(status.tags[SAMPLER_PARAM_TAG_KEY], "0.001");
        sampler.close();
    }

    #[test]
    fn test_blank_sampler_type_means_remote() {
        let sampler = SamplerConfiguration::default()
            .with_type("  ")
            .create_sampler("svc", &Metrics::noop())
            .unwrap();
        assert_eq!(
            sampler.is_sampled(0, "op").tags[SAMPLER_TYPE_TAG_KEY],
            "probabilistic"
        );
        sampler.close();
    }

    #[test]
    fn test_unknown_sampler_type_is_fatal() {
        let err = SamplerConfiguration::default()
            .with_type("lottery")
            .create_sampler("svc", &Metrics::noop())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSamplingStrategy(t) if t == "lottery"));

        let config = Configuration::new("svc")
            .unwrap()
            .with_sampler_configuration(SamplerConfiguration::default().with_type("lottery"));
        assert!(config.get_tracer().is_err());
    }

    #[test]
    fn test_from_resolver_reads_sampler_properties() {
        let config = SamplerConfiguration::from_resolver(&resolver(&[
            (JAEGER_SAMPLER_TYPE, "probabilistic"),
            (JAEGER_SAMPLER_PARAM, "0.5"),
            (JAEGER_SAMPLER_MANAGER_HOST_PORT, "collector:5778"),
        ]));

        assert_eq!(config.sampler_type(), Some("probabilistic"));
        assert_eq!(config.param(), Some(0.5));
        assert_eq!(config.manager_host_port(), Some("collector:5778"));
    }

    #[test]
    fn test_codec_config_parses_propagation_list() {
        let _g = crate::log::test_logger::activate_test_logger();
        let config = CodecConfiguration::from_resolver(&resolver(&[(
            JAEGER_PROPAGATION,
            "jaeger,b3,w3c",
        )]));

        assert_eq!(config.codecs()[&Format::HttpHeaders].len(), 2);
        assert_eq!(config.codecs()[&Format::TextMap].len(), 2);
        let logs = crate::log::test_logger::take_test_logs().unwrap();
        assert!(logs.iter().any(|(_, msg)| msg.contains("'w3c'")));
    }

    #[test]
    fn test_codec_config_accumulates_duplicate_formats() {
        let config = CodecConfiguration::from_resolver(&resolver(&[(
            JAEGER_PROPAGATION,
            "jaeger,jaeger,b3",
        )]));

        // Duplicates are kept, one entry per declaration.
        assert_eq!(config.codecs()[&Format::HttpHeaders].len(), 3);
        assert_eq!(config.codecs()[&Format::TextMap].len(), 3);
    }

    #[test]
    fn test_codec_config_installs_composite_on_tracer() {
        let config = CodecConfiguration::from_resolver(&resolver(&[(
            JAEGER_PROPAGATION,
            "jaeger,b3",
        )]));
        let mut builder = TracerBuilder::new("svc").unwrap();
        config.apply(&mut builder);
        let tracer = builder.build();

        let context = SpanContext::new(0xaf7, 0x10, 0, FLAG_SAMPLED);
        let mut carrier: StdHashMap<String, String> = StdHashMap::new();
        tracer.inject(&context, Format::TextMap, &mut carrier);

        // Both children injected: jaeger first, b3 second.
        assert!(Extractor::get(&carrier, "uber-trace-id").is_some());
        assert!(Extractor::get(&carrier, "x-b3-traceid").is_some());
        assert_eq!(tracer.extract(Format::TextMap, &carrier), Some(context));
    }

    #[test]
    fn test_codec_config_single_format_replaces_default() {
        let config =
            CodecConfiguration::from_resolver(&resolver(&[(JAEGER_PROPAGATION, "b3")]));
        let mut builder = TracerBuilder::new("svc").unwrap();
        config.apply(&mut builder);
        let tracer = builder.build();

        let context = SpanContext::new(0xaf7, 0x10, 0, FLAG_SAMPLED);
        let mut carrier: StdHashMap<String, String> = StdHashMap::new();
        tracer.inject(&context, Format::HttpHeaders, &mut carrier);

        assert!(Extractor::get(&carrier, "x-b3-traceid").is_some());
        assert!(Extractor::get(&carrier, "uber-trace-id").is_none());
    }

    #[test]
    fn test_reporter_config_log_spans_adds_logging_reporter() {
        let plain = ReporterConfiguration::default().reporter(&Metrics::noop());
        assert!(!format!("{plain:?}").contains("LoggingReporter"));
        plain.close();

        let logging = ReporterConfiguration::default()
            .with_log_spans(true)
            .reporter(&Metrics::noop());
        assert!(format!("{logging:?}").contains("LoggingReporter"));
        logging.close();
    }

    #[test]
    fn test_explicit_sender_beats_trigger_fields() {
        let explicit: Arc<dyn Sender> = Arc::new(NoopSender);
        let config = SenderConfiguration::default()
            .with_agent_host("agent.local")
            .with_agent_port(6831)
            .with_endpoint("http://collector:14268/api/traces")
            .with_sender(explicit.clone());

        assert!(Arc::ptr_eq(&config.sender(), &explicit));
    }

    #[test]
    fn test_sender_config_from_resolver() {
        let config = SenderConfiguration::from_resolver(&resolver(&[
            (JAEGER_AGENT_HOST, "agent.local"),
            (JAEGER_AGENT_PORT, "6831"),
            (JAEGER_ENDPOINT, "http://collector:14268/api/traces"),
            (JAEGER_AUTH_TOKEN, "secret"),
            (JAEGER_USER, "alice"),
            (JAEGER_PASSWORD, "hunter2"),
            (JAEGER_SENDER_FACTORY, "http"),
        ]));

        assert_eq!(config.agent_host(), Some("agent.local"));
        assert_eq!(config.agent_port(), Some(6831));
        assert_eq!(config.endpoint(), Some("http://collector:14268/api/traces"));
        assert_eq!(config.auth_token(), Some("secret"));
        assert_eq!(config.auth_username(), Some("alice"));
        assert_eq!(config.auth_password(), Some("hunter2"));
        assert_eq!(config.sender_factory(), Some("http"));
    }

    #[test]
    fn test_from_resolver_assembles_full_configuration() {
        let config = Configuration::from_resolver(&resolver(&[
            (JAEGER_SERVICE_NAME, "frontend"),
            (JAEGER_SAMPLER_TYPE, "const"),
            (JAEGER_SAMPLER_PARAM, "1"),
            (JAEGER_TAGS, "dc=${DC:us-east-1}, team=web"),
        ]))
        .unwrap();

        assert_eq!(config.service_name(), "frontend");
        let tracer = config.get_tracer().unwrap();
        assert_eq!(tracer.service_name(), "frontend");
        assert!(tracer.is_sampled(1, "op").sampled);
        assert_eq!(tracer.tags()["dc"], Some("us-east-1".to_string()));
        assert_eq!(tracer.tags()["team"], Some("web".to_string()));
        config.close_tracer();
    }

    #[test]
    fn test_missing_service_name_is_rejected() {
        assert!(Configuration::from_resolver(&resolver(&[])).is_err());
        assert!(Configuration::new("").is_err());
        assert!(Configuration::new("svc")
            .unwrap()
            .with_service_name(" ")
            .is_err());
    }

    struct CountingFactory {
        builds: AtomicUsize,
    }

    impl MetricsFactory for CountingFactory {
        fn counter(&self, _name: &'static str) -> Arc<dyn Counter> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            struct Noop;
            impl Counter for Noop {
                fn inc(&self, _delta: u64) {}
            }
            Arc::new(Noop)
        }
    }

    #[test]
    fn test_get_tracer_is_a_singleton_under_contention() {
        let factory = Arc::new(CountingFactory {
            builds: AtomicUsize::new(0),
        });
        let config = Arc::new(
            Configuration::new("svc")
                .unwrap()
                .with_sampler_configuration(
                    SamplerConfiguration::default().with_type(ConstSampler::TYPE),
                )
                .with_metrics_factory(factory.clone()),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let config = config.clone();
                std::thread::spawn(move || config.get_tracer().unwrap())
            })
            .collect();
        let tracers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for tracer in &tracers[1..] {
            assert!(Arc::ptr_eq(&tracers[0], tracer));
        }
        // One Metrics assembly means the tracer was built exactly once.
        assert_eq!(factory.builds.load(Ordering::SeqCst), 6);
        config.close_tracer();
    }

    #[test]
    fn test_close_tracer_before_build_is_noop() {
        let config = Configuration::new("svc")
            .unwrap()
            .with_sampler_configuration(
                SamplerConfiguration::default().with_type(ConstSampler::TYPE),
            );
        config.close_tracer();

        // Closing never forces a build; the tracer still comes up fresh.
        let tracer = config.get_tracer().unwrap();
        assert!(!tracer.is_closed());
        config.close_tracer();
        assert!(tracer.is_closed());
        assert!(config.get_tracer().unwrap().is_closed());
    }

    #[test]
    fn test_tracer_metrics_flow_through_configured_factory() {
        let factory = Arc::new(InMemoryMetricsFactory::new());
        let config = Configuration::new("svc")
            .unwrap()
            .with_sampler_configuration(
                SamplerConfiguration::default().with_type(ConstSampler::TYPE),
            )
            .with_metrics_factory(factory.clone());

        let tracer = config.get_tracer().unwrap();
        tracer.metrics().reporter_dropped.inc(1);
        assert_eq!(factory.counter_value("jaeger.reporter-spans.dropped"), 1);
        config.close_tracer();
    }
}
