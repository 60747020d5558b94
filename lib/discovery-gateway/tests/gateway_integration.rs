//! Gateway integration tests against mock downstream services

use discovery_core::{InMemoryRegistry, Registry};
use discovery_gateway::{
    CallContext, GatewayConfig, GatewayError, MetadataGateway, MetricsCollector, RatingGateway,
    ServiceGateway,
};
use movie_api::{Rating, RecordId, RecordType, UserId};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// TEST INFRASTRUCTURE
// =============================================================================

async fn registry_with(service: &str, servers: &[&MockServer]) -> Arc<InMemoryRegistry> {
    let registry = Arc::new(InMemoryRegistry::new());
    for (i, server) in servers.iter().enumerate() {
        registry
            .register(&format!("{}-{}", service, i), service, &server.address().to_string())
            .await
            .unwrap();
    }
    registry
}

fn closed_port_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

fn fast_config() -> GatewayConfig {
    GatewayConfig {
        request_timeout_ms: 2_000,
        connect_timeout_ms: 500,
        ..Default::default()
    }
}

// =============================================================================
// METADATA GATEWAY
// =============================================================================

#[tokio::test]
async fn test_metadata_get_decodes_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .and(query_param("id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "title": "Alien",
            "description": "In space no one can hear you scream",
            "director": "Ridley Scott"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry_with("metadata", &[&server]).await;
    let gateway = MetadataGateway::new(registry, &fast_config()).unwrap();

    let metadata = gateway.get(&CallContext::new(), "42").await.unwrap();
    assert_eq!(metadata.id, "42");
    assert_eq!(metadata.title, "Alien");
    assert_eq!(metadata.director, "Ridley Scott");
}

#[tokio::test]
async fn test_downstream_404_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let registry = registry_with("metadata", &[&server]).await;
    let gateway = MetadataGateway::new(registry, &fast_config()).unwrap();

    let err = gateway.get(&CallContext::new(), "missing").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_downstream_5xx_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let registry = registry_with("metadata", &[&server]).await;
    let gateway = MetadataGateway::new(registry, &fast_config()).unwrap();

    match gateway.get(&CallContext::new(), "42").await {
        Err(GatewayError::Upstream { service, status }) => {
            assert_eq!(service, "metadata");
            assert_eq!(status, 503);
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let registry = registry_with("metadata", &[&server]).await;
    let gateway = MetadataGateway::new(registry, &fast_config()).unwrap();

    let err = gateway.get(&CallContext::new(), "42").await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode { .. }), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_no_active_instance_is_not_found_without_calling() {
    let registry = Arc::new(InMemoryRegistry::new());
    let gateway = MetadataGateway::new(registry, &fast_config()).unwrap();

    let err = gateway.get(&CallContext::new(), "42").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Not found: metadata");
}

#[tokio::test]
async fn test_unreachable_instance_is_transport_error() {
    let registry = Arc::new(InMemoryRegistry::new());
    registry
        .register("metadata-0", "metadata", &closed_port_address())
        .await
        .unwrap();
    let gateway = MetadataGateway::new(registry, &fast_config()).unwrap();

    let err = gateway.get(&CallContext::new(), "42").await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)), "unexpected error: {}", err);
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_caller_deadline_aborts_slow_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "42", "title": "Alien"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let registry = registry_with("metadata", &[&server]).await;
    let gateway = MetadataGateway::new(registry, &GatewayConfig::default()).unwrap();

    let ctx = CallContext::new().with_timeout(Duration::from_millis(200));
    let err = gateway.get(&ctx, "42").await.unwrap_err();
    assert!(matches!(err, GatewayError::DeadlineExceeded));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_cancelled_caller_aborts_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let registry = registry_with("metadata", &[&server]).await;
    let gateway = MetadataGateway::new(registry, &GatewayConfig::default()).unwrap();

    let token = CancellationToken::new();
    let ctx = CallContext::new().with_cancellation(token.clone());
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let err = gateway.get(&ctx, "42").await.unwrap_err();
    assert!(matches!(err, GatewayError::Cancelled));
}

#[tokio::test]
async fn test_calls_spread_across_instances() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    for server in [&first, &second] {
        Mock::given(method("GET"))
            .and(path("/metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1", "title": "Heat"})))
            .mount(server)
            .await;
    }

    let registry = registry_with("metadata", &[&first, &second]).await;
    let gateway = MetadataGateway::new(registry, &fast_config()).unwrap();
    for _ in 0..40 {
        gateway.get(&CallContext::new(), "1").await.unwrap();
    }

    let first_hits = first.received_requests().await.unwrap().len();
    let second_hits = second.received_requests().await.unwrap().len();
    assert_eq!(first_hits + second_hits, 40);
    assert!(first_hits > 0 && second_hits > 0);
}

// =============================================================================
// RATING GATEWAY
// =============================================================================

#[tokio::test]
async fn test_aggregated_rating() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rating"))
        .and(query_param("id", "42"))
        .and(query_param("type", "movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(4.5)))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry_with("rating", &[&server]).await;
    let gateway = RatingGateway::new(registry, &fast_config()).unwrap();

    let rating = gateway
        .get_aggregated_rating(&CallContext::new(), &RecordId::new("42"), &RecordType::movie())
        .await
        .unwrap();
    assert!((rating - 4.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_put_rating_sends_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/rating"))
        .and(query_param("id", "42"))
        .and(query_param("type", "movie"))
        .and(query_param("userId", "alice"))
        .and(query_param("value", "5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry_with("rating", &[&server]).await;
    let gateway = RatingGateway::new(registry, &fast_config()).unwrap();

    let rating = Rating {
        record_id: RecordId::new("42"),
        record_type: RecordType::movie(),
        user_id: UserId("alice".to_string()),
        value: 5,
    };
    gateway
        .put_rating(&CallContext::new(), &rating.record_id, &rating.record_type, &rating)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_put_rating_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/rating"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let registry = registry_with("rating", &[&server]).await;
    let gateway = RatingGateway::new(registry, &fast_config()).unwrap();

    let rating = Rating {
        record_id: RecordId::new("42"),
        record_type: RecordType::movie(),
        user_id: UserId("alice".to_string()),
        value: 11,
    };
    let err = gateway
        .put_rating(&CallContext::new(), &rating.record_id, &rating.record_type, &rating)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Upstream { status: 400, .. }));
}

// =============================================================================
// METRICS
// =============================================================================

#[tokio::test]
async fn test_call_outcomes_are_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1", "title": "Heat"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .and(query_param("id", "2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let registry = registry_with("metadata", &[&server]).await;
    let metrics = MetricsCollector::new().unwrap();
    let gateway = MetadataGateway::from_gateway(
        ServiceGateway::new(registry, "metadata", &fast_config())
            .unwrap()
            .with_metrics(metrics.clone()),
    );

    gateway.get(&CallContext::new(), "1").await.unwrap();
    assert!(gateway.get(&CallContext::new(), "2").await.is_err());

    let calls = &metrics.gateway_calls_total;
    assert_eq!(calls.with_label_values(&["metadata", "ok"]).get(), 1);
    assert_eq!(calls.with_label_values(&["metadata", "not_found"]).get(), 1);
}
