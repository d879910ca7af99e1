// * GraphQL client for the billing platform API

use crate::billing::backend::{BillingBackend, BillingFuture};
use crate::billing::errors::BillingError;
use crate::billing::types::{
    BillingOperation, CreateSubscriptionRequest, ImportCustomerRequest, ProvisionCustomerRequest,
    ReportUsageRequest,
};
use crate::network::JsonClient;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const API_KEY_HEADER: &str = "x-api-key";

const PROVISION_CUSTOMER: &str = "mutation ProvisionCustomer($input: ProvisionCustomerInput!) { \
    provisionCustomer(input: $input) { customer { customerId } } }";

const IMPORT_CUSTOMER: &str = "mutation ImportCustomer($input: ImportCustomerInput!) { \
    importOneCustomer(input: $input) { customerId } }";

const CREATE_SUBSCRIPTION: &str = "mutation CreateSubscription($input: SubscriptionInput!) { \
    createSubscription(subscription: $input) { subscriptionId } }";

const REPORT_USAGE: &str = "mutation ReportUsage($input: UsageMeasurementCreateInput!) { \
    reportUsage(input: $input) { id } }";

/// Settings used once per run to build the client
#[derive(Debug)]
pub struct BillingClientConfig {
    pub api_key: SecretString,
    pub api_url: Url,
    pub timeout: Duration,
    /// Push updates are never needed by a batch run; the HTTP client has no
    /// push channel, so enabling this only logs a warning
    pub realtime_updates_enabled: bool,
}

#[derive(Serialize)]
struct GraphQlRequest<'a, V: Serialize> {
    query: &'static str,
    variables: GraphQlVariables<'a, V>,
}

#[derive(Serialize)]
struct GraphQlVariables<'a, V: Serialize> {
    input: &'a V,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Billing backend speaking the platform's GraphQL API over HTTPS
#[derive(Debug, Clone)]
pub struct HttpBillingClient {
    client: JsonClient,
    endpoint: Url,
}

impl HttpBillingClient {
    pub fn initialize(config: BillingClientConfig) -> Result<Self, BillingError> {
        if config.realtime_updates_enabled {
            tracing::warn!("Realtime updates are not supported by the batch client and will be ignored");
        }

        let client = JsonClient::new(
            config.timeout,
            &[(API_KEY_HEADER, config.api_key.expose_secret())],
        )?;

        tracing::debug!(endpoint = %config.api_url, "Billing client initialized");

        Ok(Self {
            client,
            endpoint: config.api_url,
        })
    }

    async fn execute<V: Serialize>(
        &self,
        operation: BillingOperation,
        query: &'static str,
        input: &V,
    ) -> Result<(), BillingError> {
        let request = GraphQlRequest {
            query,
            variables: GraphQlVariables { input },
        };

        let response: GraphQlResponse = self
            .client
            .post_json(self.endpoint.as_str(), &request)
            .await
            .map_err(|e| {
                if e.is_server_pressure() {
                    tracing::warn!(operation = %operation, error = %e, "Billing API under pressure");
                }
                BillingError::from(e)
            })?;

        if !response.errors.is_empty() {
            return Err(BillingError::Api(
                response.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        match response.data {
            Some(data) if !data.is_null() => Ok(()),
            _ => Err(BillingError::EmptyResponse(operation.as_str())),
        }
    }
}

impl BillingBackend for HttpBillingClient {
    fn provision_customer<'a>(&'a self, request: &'a ProvisionCustomerRequest) -> BillingFuture<'a> {
        Box::pin(self.execute(BillingOperation::ProvisionCustomer, PROVISION_CUSTOMER, request))
    }

    fn import_customer<'a>(&'a self, request: &'a ImportCustomerRequest) -> BillingFuture<'a> {
        Box::pin(self.execute(BillingOperation::ImportCustomer, IMPORT_CUSTOMER, request))
    }

    fn create_subscription<'a>(&'a self, request: &'a CreateSubscriptionRequest) -> BillingFuture<'a> {
        Box::pin(self.execute(BillingOperation::CreateSubscription, CREATE_SUBSCRIPTION, request))
    }

    fn report_usage<'a>(&'a self, request: &'a ReportUsageRequest) -> BillingFuture<'a> {
        Box::pin(self.execute(BillingOperation::ReportUsage, REPORT_USAGE, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_payload_decodes() {
        let body = r#"{"data":null,"errors":[{"message":"Plan not found","path":["provisionCustomer"]}]}"#;
        let response: GraphQlResponse = serde_json::from_str(body).unwrap();
        assert!(response.data.unwrap_or_default().is_null());
        assert_eq!(response.errors[0].message, "Plan not found");
    }

    #[test]
    fn test_graphql_success_payload_has_no_errors() {
        let body = r#"{"data":{"reportUsage":{"id":"u-1"}}}"#;
        let response: GraphQlResponse = serde_json::from_str(body).unwrap();
        assert!(response.errors.is_empty());
        assert!(response.data.is_some());
    }

    #[test]
    fn test_request_wraps_input_variable() {
        let usage = ReportUsageRequest {
            customer_id: "cus-1".to_string(),
            feature_id: "feat-a".to_string(),
            value: 3.0,
        };
        let request = GraphQlRequest {
            query: REPORT_USAGE,
            variables: GraphQlVariables { input: &usage },
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["variables"]["input"]["featureId"], "feat-a");
        assert_eq!(json["variables"]["input"]["value"], 3.0);
        assert!(json["query"].as_str().unwrap().contains("reportUsage"));
    }

    #[test]
    fn test_initialize_with_realtime_disabled() {
        let client = HttpBillingClient::initialize(BillingClientConfig {
            api_key: SecretString::from("sk-test".to_string()),
            api_url: Url::parse("https://api.example.com/graphql").unwrap(),
            timeout: Duration::from_secs(5),
            realtime_updates_enabled: false,
        });
        assert!(client.is_ok());
    }
}
