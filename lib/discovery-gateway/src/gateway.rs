//! Registry-backed HTTP gateway to one downstream service
//!
//! Every call resolves the service afresh, picks one active instance and
//! issues a single request against it. A failed instance is not retried
//! with another address; retrying is the caller's decision.

use crate::load_balancer::{LoadBalancer, LoadBalancingStrategy};
use crate::{CallContext, GatewayError, MetricsCollector, Result};
use discovery_core::Registry;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Gateway configuration
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Total timeout for one outbound request, in milliseconds
    pub request_timeout_ms: u64,
    /// Connection timeout, in milliseconds
    pub connect_timeout_ms: u64,
    /// Instance selection strategy
    pub strategy: LoadBalancingStrategy,
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Build the HTTP client shared by the gateways of one process
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout())
            .connect_timeout(self.connect_timeout())
            .build()
            .map_err(GatewayError::Transport)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            strategy: LoadBalancingStrategy::Random,
        }
    }
}

/// HTTP gateway resolving a named service through the registry
pub struct ServiceGateway {
    registry: Arc<dyn Registry>,
    service_name: String,
    client: reqwest::Client,
    load_balancer: LoadBalancer,
    metrics: Option<MetricsCollector>,
}

impl ServiceGateway {
    /// Create a gateway with its own HTTP client
    pub fn new(
        registry: Arc<dyn Registry>,
        service_name: impl Into<String>,
        config: &GatewayConfig,
    ) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self::with_client(registry, service_name, client, config.strategy))
    }

    /// Create a gateway sharing an existing HTTP client
    pub fn with_client(
        registry: Arc<dyn Registry>,
        service_name: impl Into<String>,
        client: reqwest::Client,
        strategy: LoadBalancingStrategy,
    ) -> Self {
        Self {
            registry,
            service_name: service_name.into(),
            client,
            load_balancer: LoadBalancer::new(strategy),
            metrics: None,
        }
    }

    /// Record call outcomes in `metrics`
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Resolve the service and pick one active instance address
    pub async fn resolve(&self) -> Result<String> {
        let addresses = self.registry.service_addresses(&self.service_name).await?;
        let address = self
            .load_balancer
            .select(&addresses)
            .ok_or_else(|| GatewayError::NotFound(self.service_name.clone()))?;

        debug!("Selected {} for {} out of {}", address, self.service_name, addresses.len());
        Ok(address.to_string())
    }

    /// Issue a request and decode a JSON response body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let started = Instant::now();
        let result = ctx
            .run(async {
                let response = self.dispatch(Method::GET, path, query).await?;
                let body = response.bytes().await.map_err(GatewayError::Transport)?;
                serde_json::from_slice(&body).map_err(|e| GatewayError::Decode {
                    service: self.service_name.clone(),
                    reason: e.to_string(),
                })
            })
            .await;
        self.observe(&result, started);
        result
    }

    /// Issue a request whose response body is not needed
    pub async fn send(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<()> {
        let started = Instant::now();
        let result = ctx
            .run(async {
                self.dispatch(method, path, query).await?;
                Ok(())
            })
            .await;
        self.observe(&result, started);
        result
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response> {
        let address = self.resolve().await?;
        let url = format!("http://{}{}", address, path);
        debug!("Calling {} service. Request {} {}", self.service_name, method, url);

        let response = self
            .client
            .request(method, &url)
            .query(query)
            .send()
            .await
            .map_err(GatewayError::Transport)?;

        self.translate_status(response)
    }

    fn translate_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(self.service_name.clone()));
        }
        if !status.is_success() {
            return Err(GatewayError::Upstream {
                service: self.service_name.clone(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn observe<T>(&self, result: &Result<T>, started: Instant) {
        if let Some(metrics) = &self.metrics {
            let outcome = match result {
                Ok(_) => "ok",
                Err(e) => e.kind(),
            };
            metrics.observe_call(&self.service_name, outcome, started.elapsed());
        }
    }
}
