//! HTTP request handling for the movie service

use crate::controller::MovieController;
use discovery_gateway::{AdmissionLimiter, CallContext, GatewayError, MetricsCollector};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shared state of the request handlers
pub struct AppState {
    pub controller: MovieController,
    pub limiter: AdmissionLimiter,
    pub metrics: MetricsCollector,
    /// Deadline applied to every downstream call made for one request
    pub request_timeout: Duration,
    /// Cancels in-flight downstream calls when the process shuts down
    pub shutdown: CancellationToken,
}

#[derive(Deserialize)]
struct MovieQuery {
    id: Option<String>,
}

pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or_default().to_string();

    Ok(route(&method, &path, &query, &state).await)
}

/// Dispatch one request by method and path
pub async fn route(method: &Method, path: &str, query: &str, state: &AppState) -> Response<Full<Bytes>> {
    debug!("{} {}", method, path);

    let response = match (method, path) {
        (&Method::GET, "/movie") => get_movie(query, state).await,
        (&Method::GET, "/healthz") => text_response(StatusCode::OK, "OK\n"),
        (&Method::GET, "/metrics") => match state.metrics.gather() {
            Ok(metrics) => {
                let mut response = text_response(StatusCode::OK, metrics);
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; version=0.0.4"),
                );
                response
            }
            Err(e) => {
                warn!("Failed to gather metrics: {}", e);
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to gather metrics\n")
            }
        },
        (_, "/movie") | (_, "/healthz") | (_, "/metrics") => {
            text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed\n")
        }
        _ => text_response(StatusCode::NOT_FOUND, "Not Found\n"),
    };

    let route_label = match path {
        "/movie" | "/healthz" | "/metrics" => path,
        _ => "other",
    };
    state
        .metrics
        .http_requests_total
        .with_label_values(&[method.as_str(), route_label])
        .inc();
    state
        .metrics
        .http_responses_total
        .with_label_values(&[response.status().as_str()])
        .inc();

    response
}

async fn get_movie(query: &str, state: &AppState) -> Response<Full<Bytes>> {
    if !state.limiter.is_admitted() {
        return error_response(&GatewayError::ResourceExhausted);
    }

    let id = match serde_urlencoded::from_str::<MovieQuery>(query) {
        Ok(MovieQuery { id: Some(id) }) if !id.is_empty() => id,
        _ => return text_response(StatusCode::BAD_REQUEST, "Missing movie id\n"),
    };

    let ctx = CallContext::new()
        .with_timeout(state.request_timeout)
        .with_cancellation(state.shutdown.clone());

    match state.controller.get(&ctx, &id).await {
        Ok(details) => match serde_json::to_vec(&details) {
            Ok(body) => {
                let mut response = Response::new(Full::new(Bytes::from(body)));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                response
            }
            Err(e) => {
                warn!("Failed to encode movie {}: {}", id, e);
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n")
            }
        },
        Err(e) => {
            if e.is_not_found() {
                debug!("Movie {} not found: {}", id, e);
            } else {
                warn!("Failed to get movie {}: {}", id, e);
            }
            error_response(&e)
        }
    }
}

/// HTTP status reported for a gateway error
pub fn error_status(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        GatewayError::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        GatewayError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        GatewayError::Upstream { .. } | GatewayError::Transport(_) | GatewayError::Decode { .. } => {
            StatusCode::BAD_GATEWAY
        }
        GatewayError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        GatewayError::InvalidConfiguration(_) | GatewayError::Registry(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &GatewayError) -> Response<Full<Bytes>> {
    text_response(error_status(err), format!("{}\n", err))
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}
