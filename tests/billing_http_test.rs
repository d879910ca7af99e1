use chrono::{TimeZone, Utc};
use customer_import::billing::{
    BillingBackend, BillingClientConfig, BillingError, CreateSubscriptionRequest, HttpBillingClient,
    ImportCustomerRequest, ProvisionCustomerRequest, ReportUsageRequest,
};
use customer_import::network::NetworkError;
use customer_import::CustomerRecord;
use httpmock::prelude::*;
use secrecy::SecretString;
use serde_json::json;
use std::time::Duration;
use url::Url;

fn client_for(server: &MockServer) -> HttpBillingClient {
    HttpBillingClient::initialize(BillingClientConfig {
        api_key: SecretString::from("sk-test-123".to_string()),
        api_url: Url::parse(&server.url("/graphql")).unwrap(),
        timeout: Duration::from_secs(5),
        realtime_updates_enabled: false,
    })
    .unwrap()
}

fn paid_record() -> CustomerRecord {
    CustomerRecord::builder("cus-1", "ada@example.com", "Ada Lovelace")
        .billing_id("cus_stripe_1")
        .plan("plan-revvenu-pro")
        .start_date(Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap())
        .usage("feat-a", 3.0)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_provision_sends_api_key_and_input() {
    let server = MockServer::start_async().await;
    let provision_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .header("x-api-key", "sk-test-123")
            .body_contains("provisionCustomer")
            .body_contains("\"customerId\":\"cus-1\"")
            .body_contains("\"billingPeriod\":\"MONTHLY\"");
        then.status(200)
            .json_body(json!({"data": {"provisionCustomer": {"customer": {"customerId": "cus-1"}}}}));
    });

    let client = client_for(&server);
    let record = CustomerRecord::builder("cus-1", "ada@example.com", "Ada Lovelace")
        .plan("plan-revvenu-basic")
        .build()
        .unwrap();

    client
        .provision_customer(&ProvisionCustomerRequest::from_record(&record))
        .await
        .unwrap();
    provision_mock.assert();
}

#[tokio::test]
async fn test_paid_workflow_mutations() {
    let server = MockServer::start_async().await;
    let import_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("importOneCustomer")
            .body_contains("\"billingId\":\"cus_stripe_1\"");
        then.status(200)
            .json_body(json!({"data": {"importOneCustomer": {"customerId": "cus-1"}}}));
    });
    let subscription_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("createSubscription")
            .body_contains("\"planId\":\"plan-revvenu-pro\"")
            .body_contains("2021-06-01T00:00:00Z");
        then.status(200)
            .json_body(json!({"data": {"createSubscription": {"subscriptionId": "sub-1"}}}));
    });
    let usage_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("reportUsage")
            .body_contains("\"featureId\":\"feat-a\"");
        then.status(200).json_body(json!({"data": {"reportUsage": {"id": "m-1"}}}));
    });

    let client = client_for(&server);
    let record = paid_record();

    let import = ImportCustomerRequest::from_record(&record).unwrap();
    client.import_customer(&import).await.unwrap();
    client
        .create_subscription(&CreateSubscriptionRequest::from_record(&record))
        .await
        .unwrap();
    for usage in ReportUsageRequest::all_from_record(&record) {
        client.report_usage(&usage).await.unwrap();
    }

    import_mock.assert();
    subscription_mock.assert();
    usage_mock.assert();
}

#[tokio::test]
async fn test_graphql_errors_become_api_error() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(json!({
            "data": null,
            "errors": [{"message": "Plan not found"}, {"message": "Customer already exists"}]
        }));
    });

    let client = client_for(&server);
    let record = paid_record();
    let err = client
        .create_subscription(&CreateSubscriptionRequest::from_record(&record))
        .await
        .unwrap_err();

    match err {
        BillingError::Api(messages) => {
            assert_eq!(messages, vec!["Plan not found", "Customer already exists"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_null_data_is_empty_response() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(json!({"data": null}));
    });

    let client = client_for(&server);
    let usage = ReportUsageRequest {
        customer_id: "cus-1".to_string(),
        feature_id: "feat-a".to_string(),
        value: 1.0,
    };
    let err = client.report_usage(&usage).await.unwrap_err();

    assert!(matches!(err, BillingError::EmptyResponse("report_usage")));
}

#[tokio::test]
async fn test_http_failure_keeps_status() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(401).body("{\"message\":\"invalid api key\"}");
    });

    let client = client_for(&server);
    let import = ImportCustomerRequest::from_record(&paid_record()).unwrap();
    let err = client.import_customer(&import).await.unwrap_err();

    assert!(matches!(
        err,
        BillingError::Network(NetworkError::Status { status: 401, .. })
    ));
}
