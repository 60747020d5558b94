//! Prometheus metrics for inbound requests and outbound gateway calls

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Prometheus metrics collector shared by gateways, the limiter and the server
#[derive(Clone)]
pub struct MetricsCollector {
    /// Inbound HTTP requests by method and path
    pub http_requests_total: IntCounterVec,
    /// Inbound HTTP responses by status code
    pub http_responses_total: IntCounterVec,
    /// Outbound gateway calls by target service and outcome
    pub gateway_calls_total: IntCounterVec,
    /// Outbound gateway call latency in seconds
    pub gateway_call_duration_seconds: HistogramVec,
    /// Requests rejected by the admission limiter
    pub admission_rejections_total: IntCounter,
    /// Prometheus registry for metrics
    pub registry: Arc<Registry>,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "path"],
        )?;

        let http_responses_total = IntCounterVec::new(
            Opts::new("http_responses_total", "Total HTTP responses by status"),
            &["status"],
        )?;

        let gateway_calls_total = IntCounterVec::new(
            Opts::new("gateway_calls_total", "Outbound gateway calls by service and outcome"),
            &["service", "outcome"],
        )?;

        let gateway_call_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "gateway_call_duration_seconds",
                "Outbound gateway call latency in seconds",
            ),
            &["service"],
        )?;

        let admission_rejections_total = IntCounter::new(
            "admission_rejections_total",
            "Requests rejected by the admission limiter",
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_responses_total.clone()))?;
        registry.register(Box::new(gateway_calls_total.clone()))?;
        registry.register(Box::new(gateway_call_duration_seconds.clone()))?;
        registry.register(Box::new(admission_rejections_total.clone()))?;

        Ok(Self {
            http_requests_total,
            http_responses_total,
            gateway_calls_total,
            gateway_call_duration_seconds,
            admission_rejections_total,
            registry,
        })
    }

    /// Record the outcome of one gateway call
    pub fn observe_call(&self, service: &str, outcome: &str, elapsed: Duration) {
        self.gateway_calls_total
            .with_label_values(&[service, outcome])
            .inc();
        self.gateway_call_duration_seconds
            .with_label_values(&[service])
            .observe(elapsed.as_secs_f64());
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
