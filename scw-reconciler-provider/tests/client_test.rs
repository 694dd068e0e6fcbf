//! HTTP behavior of the vendor client against a mock server.

use std::time::Duration;

use scw_reconciler_provider::{ClientOptions, ErrorClass, Region, ScwClient, VendorError, classify};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_ID: &str = "11111111-2222-3333-4444-555555555555";
const PROJECT_ID: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";

fn client_for(server: &MockServer, max_retries: u32) -> ScwClient {
    ScwClient::new(
        ClientOptions::new("test-secret")
            .with_api_url(server.uri())
            .with_request_timeout(Duration::from_secs(5))
            .with_max_retries(max_retries),
    )
    .unwrap()
}

fn token_body() -> serde_json::Value {
    json!({
        "id": TOKEN_ID,
        "project_id": PROJECT_ID,
        "name": "ci",
        "scopes": ["read_only_metrics"],
        "secret_key": null,
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-01T10:00:00Z",
        "region": "fr-par"
    })
}

// ============ Authentication & decoding ============

#[tokio::test]
async fn get_sends_auth_header_and_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/cockpit/v1/regions/fr-par/tokens/{TOKEN_ID}")))
        .and(header("X-Auth-Token", "test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 0);
    let token = client
        .cockpit()
        .get_token(Region::FrPar, Uuid::parse_str(TOKEN_ID).unwrap())
        .await
        .unwrap();

    assert_eq!(token.name, "ci");
    assert_eq!(token.region, Region::FrPar);
    assert!(token.secret_key.is_none());
}

#[tokio::test]
async fn post_sends_json_body() {
    let server = MockServer::start().await;
    let deployment = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";
    Mock::given(method("POST"))
        .and(path(format!(
            "/datawarehouse/v1beta1/regions/nl-ams/deployments/{deployment}/databases"
        )))
        .and(body_json(json!({"name": "analytics"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "analytics", "size": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 0);
    let db = client
        .datawarehouse()
        .create_database(Region::NlAms, Uuid::parse_str(deployment).unwrap(), "analytics")
        .await
        .unwrap();
    assert_eq!(db.name, "analytics");
}

#[tokio::test]
async fn list_filters_by_name() {
    let server = MockServer::start().await;
    let deployment = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";
    Mock::given(method("GET"))
        .and(path(format!(
            "/datawarehouse/v1beta1/regions/fr-par/deployments/{deployment}/databases"
        )))
        .and(query_param("name", "missing"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"databases": [], "total_count": 0})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, 0);
    let err = client
        .datawarehouse()
        .get_database(Region::FrPar, Uuid::parse_str(deployment).unwrap(), "missing")
        .await
        .unwrap_err();
    assert_eq!(classify(&err), ErrorClass::NotFound);
}

// ============ Error mapping ============

#[tokio::test]
async fn structured_not_found_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "type": "not_found",
            "resource": "vpn_gateway",
            "resource_id": TOKEN_ID,
            "message": "resource is not found"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let err = client
        .vpn()
        .get_gateway(Region::FrPar, Uuid::parse_str(TOKEN_ID).unwrap())
        .await
        .unwrap_err();
    assert!(
        matches!(&err, VendorError::ResourceNotFound { resource, .. } if resource == "vpn_gateway"),
        "unexpected: {err:?}"
    );
}

#[tokio::test]
async fn bare_403_is_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let client = client_for(&server, 0);
    let err = client
        .cockpit()
        .delete_token(Region::FrPar, Uuid::parse_str(TOKEN_ID).unwrap())
        .await
        .unwrap_err();
    assert_eq!(classify(&err), ErrorClass::Forbidden);
}

#[tokio::test]
async fn malformed_success_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let client = client_for(&server, 0);
    let err = client.domain().get_domain("example.com").await.unwrap_err();
    assert!(matches!(err, VendorError::ParseError { .. }));
}

// ============ Retry ============

#[tokio::test]
async fn retries_gateway_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let token = client
        .cockpit()
        .get_token(Region::FrPar, Uuid::parse_str(TOKEN_ID).unwrap())
        .await
        .unwrap();
    assert_eq!(token.name, "ci");
}

#[tokio::test]
async fn retries_exhausted_surface_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server, 2);
    let err = client
        .cockpit()
        .get_token(Region::FrPar, Uuid::parse_str(TOKEN_ID).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, VendorError::Response { status: 502, .. }));
    assert_eq!(classify(&err), ErrorClass::Transient);
}

#[tokio::test]
async fn structured_errors_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "type": "transient_state",
            "resource": "vpn_gateway",
            "resource_id": TOKEN_ID,
            "current_state": "configuring"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 5);
    let err = client
        .vpn()
        .get_gateway(Region::FrPar, Uuid::parse_str(TOKEN_ID).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, VendorError::TransientState { .. }));
}

#[tokio::test]
async fn rate_limit_honors_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .mount(&server)
        .await;

    let client = client_for(&server, 1);
    let result = client
        .cockpit()
        .get_token(Region::FrPar, Uuid::parse_str(TOKEN_ID).unwrap())
        .await;
    assert!(result.is_ok(), "unexpected: {result:?}");
}

#[tokio::test]
async fn post_not_resent_after_timeout() {
    let server = MockServer::start().await;
    let deployment = Uuid::parse_str(PROJECT_ID).unwrap();
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"name": "analytics", "size": 0}))
                .set_delay(Duration::from_millis(1500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ScwClient::new(
        ClientOptions::new("test-secret")
            .with_api_url(server.uri())
            .with_request_timeout(Duration::from_millis(500))
            .with_max_retries(2),
    )
    .unwrap();
    let err = client
        .datawarehouse()
        .create_database(Region::NlAms, deployment, "analytics")
        .await
        .unwrap_err();
    assert!(matches!(err, VendorError::Timeout { .. }), "unexpected: {err:?}");
}

#[tokio::test]
async fn post_not_resent_after_gateway_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let err = client
        .datawarehouse()
        .create_database(Region::NlAms, Uuid::parse_str(PROJECT_ID).unwrap(), "analytics")
        .await
        .unwrap_err();
    assert!(matches!(err, VendorError::Response { status: 503, .. }));
}

#[tokio::test]
async fn post_resent_when_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "analytics", "size": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 2);
    let db = client
        .datawarehouse()
        .create_database(Region::NlAms, Uuid::parse_str(PROJECT_ID).unwrap(), "analytics")
        .await
        .unwrap();
    assert_eq!(db.name, "analytics");
}

// ============ Domain registrar ============

#[tokio::test]
async fn domain_order_and_auto_renew() {
    let server = MockServer::start().await;
    let task_id = "bbbbbbbb-0000-0000-0000-000000000001";
    Mock::given(method("POST"))
        .and(path("/domain/v2beta1/buy-domains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "project_id": PROJECT_ID,
            "task_id": task_id,
            "domains": ["example.com"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/domain/v2beta1/domains/example.com/disable-auto-renew"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "domain": "example.com",
            "project_id": PROJECT_ID,
            "status": "active",
            "auto_renew_status": "disabling"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 0);
    let order = client
        .domain()
        .buy_domains(&scw_reconciler_provider::services::domain::BuyDomainsRequest {
            project_id: Uuid::parse_str(PROJECT_ID).unwrap(),
            domains: vec!["example.com".into()],
            duration_in_years: 1,
            owner_contact_id: None,
        })
        .await
        .unwrap();
    assert_eq!(order.task_id.to_string(), task_id);

    let domain = client
        .domain()
        .set_auto_renew("example.com", false)
        .await
        .unwrap();
    assert_eq!(
        domain.auto_renew_status,
        scw_reconciler_provider::services::domain::AutoRenewStatus::Disabling
    );
}
