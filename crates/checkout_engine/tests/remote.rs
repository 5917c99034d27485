use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use checkout_core::{classify, BatchConfig, ErrorCategory, ItemStatus, WorkItem};
use checkout_engine::{AlmaLoanClient, AlmaSettings, BatchScheduler, RemoteCall};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AlmaLoanClient {
    AlmaLoanClient::new(AlmaSettings {
        base_url: server.uri(),
        api_key: Some("secret".to_string()),
        ..AlmaSettings::default()
    })
    .expect("client")
}

fn desk_config() -> BatchConfig {
    BatchConfig::new("MAIN", "DESK1")
}

#[tokio::test]
async fn posts_loan_with_desk_and_library() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/almaws/v1/users/u-1/loans"))
        .and(query_param("item_barcode", "B0001"))
        .and(query_param("apikey", "secret"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({
            "circ_desk": { "value": "DESK1" },
            "library": { "value": "MAIN" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "loan_id": "1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .call(&WorkItem::new("u-1", "B0001"), &desk_config())
        .await
        .expect("loan created");
}

#[tokio::test]
async fn error_payload_is_kept_for_classification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/almaws/v1/users/u-2/loans"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorsExist": true,
            "errorList": { "error": [{ "errorCode": "401153", "errorMessage": "Item cannot be loaned from this circulation desk." }] }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .call(&WorkItem::new("u-2", "B0002"), &desk_config())
        .await
        .unwrap_err();

    assert_eq!(err.status, 400);
    let outcome = classify(&err);
    assert_eq!(outcome.category(), Some(ErrorCategory::InvalidRequest));
    assert_eq!(outcome.message(), "Item cannot be loaned from this circulation desk.");
}

#[tokio::test]
async fn non_json_error_body_has_no_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>missing</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .call(&WorkItem::new("ghost", "B0003"), &desk_config())
        .await
        .unwrap_err();

    assert_eq!(err.status, 404);
    assert!(err.payload.is_none());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = AlmaLoanClient::new(AlmaSettings {
        base_url: format!("http://{addr}"),
        connect_timeout: Duration::from_millis(200),
        request_timeout: Duration::from_millis(500),
        ..AlmaSettings::default()
    })
    .unwrap();
    let err = client
        .call(&WorkItem::new("u-4", "B0004"), &desk_config())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert_eq!(err.status, 0);
    assert_eq!(classify(&err).category(), Some(ErrorCategory::TransportError));
}

#[tokio::test]
async fn scheduler_retries_service_unavailable_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/almaws/v1/users/u-5/loans"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = BatchConfig {
        base_delay_ms: 5,
        max_delay_ms: 20,
        ..desk_config()
    };
    let scheduler = BatchScheduler::new(Arc::new(client_for(&server)));
    let items = vec![WorkItem::new("u-5", "B0005"), WorkItem::new("u-6", "B0006")];

    let summary = scheduler.run(items, &config).await.unwrap();

    assert_eq!(summary.success_count, 2);
    assert!(scheduler
        .items()
        .iter()
        .all(|item| item.status() == ItemStatus::Success));
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}
