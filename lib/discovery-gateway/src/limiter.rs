//! Admission limiter gating inbound requests

use crate::{GatewayError, MetricsCollector, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Deserialize;
use std::num::NonZeroU32;
use tracing::debug;

/// Token bucket parameters for the admission limiter
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LimiterConfig {
    /// Steady-state admitted requests per second
    pub rate_per_second: u32,
    /// Requests admitted back to back from a full bucket
    pub burst: u32,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            rate_per_second: 100,
            burst: 100,
        }
    }
}

/// Token bucket gate applied before request dispatch.
///
/// Each check takes one token without waiting; an empty bucket rejects the
/// request immediately.
pub struct AdmissionLimiter {
    limiter: DefaultDirectRateLimiter,
    metrics: Option<MetricsCollector>,
}

impl AdmissionLimiter {
    pub fn new(rate_per_second: u32, burst: u32) -> Result<Self> {
        let rate = NonZeroU32::new(rate_per_second).ok_or_else(|| {
            GatewayError::InvalidConfiguration("limiter rate must be positive".to_string())
        })?;
        let burst = NonZeroU32::new(burst).ok_or_else(|| {
            GatewayError::InvalidConfiguration("limiter burst must be positive".to_string())
        })?;

        Ok(Self {
            limiter: RateLimiter::direct(Quota::per_second(rate).allow_burst(burst)),
            metrics: None,
        })
    }

    pub fn from_config(config: &LimiterConfig) -> Result<Self> {
        Self::new(config.rate_per_second, config.burst)
    }

    /// Count rejections in `metrics`
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether a request arriving now is admitted
    pub fn is_admitted(&self) -> bool {
        if self.limiter.check().is_ok() {
            return true;
        }

        debug!("Admission limiter rejected request");
        if let Some(metrics) = &self.metrics {
            metrics.admission_rejections_total.inc();
        }
        false
    }

    /// Like `is_admitted`, reporting rejection as `ResourceExhausted`
    pub fn admit(&self) -> Result<()> {
        if self.is_admitted() {
            Ok(())
        } else {
            Err(GatewayError::ResourceExhausted)
        }
    }
}
