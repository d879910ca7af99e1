// * Request payloads for the four billing operations
// * Serialized in the billing API's camelCase shape

use crate::records::{BillingPeriod, CustomerRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillingOperation {
    ProvisionCustomer,
    ImportCustomer,
    CreateSubscription,
    ReportUsage,
}

impl BillingOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingOperation::ProvisionCustomer => "provision_customer",
            BillingOperation::ImportCustomer => "import_customer",
            BillingOperation::CreateSubscription => "create_subscription",
            BillingOperation::ReportUsage => "report_usage",
        }
    }
}

impl fmt::Display for BillingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionParams {
    pub plan_id: String,
    pub billing_period: BillingPeriod,
    pub start_date: DateTime<Utc>,
}

/// Creates a customer and starts its subscription in one call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionCustomerRequest {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub subscription_params: SubscriptionParams,
}

/// Registers a customer that already exists in the payment provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCustomerRequest {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub billing_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub customer_id: String,
    pub plan_id: String,
    pub billing_period: BillingPeriod,
    pub start_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportUsageRequest {
    pub customer_id: String,
    pub feature_id: String,
    pub value: f64,
}

impl ProvisionCustomerRequest {
    pub fn from_record(record: &CustomerRecord) -> Self {
        Self {
            customer_id: record.customer_id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            subscription_params: SubscriptionParams {
                plan_id: record.subscription_plan_id.clone(),
                billing_period: record.subscription_billing_period,
                start_date: record.subscription_start_date,
            },
        }
    }
}

impl ImportCustomerRequest {
    /// Returns `None` for free customers, which have nothing to import
    pub fn from_record(record: &CustomerRecord) -> Option<Self> {
        record.billing_id.as_ref().map(|billing_id| Self {
            customer_id: record.customer_id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            billing_id: billing_id.clone(),
        })
    }
}

impl CreateSubscriptionRequest {
    pub fn from_record(record: &CustomerRecord) -> Self {
        Self {
            customer_id: record.customer_id.clone(),
            plan_id: record.subscription_plan_id.clone(),
            billing_period: record.subscription_billing_period,
            start_date: record.subscription_start_date,
        }
    }
}

impl ReportUsageRequest {
    /// One request per usage entry of the record
    pub fn all_from_record(record: &CustomerRecord) -> Vec<Self> {
        record
            .features_usage
            .iter()
            .map(|(feature_id, value)| Self {
                customer_id: record.customer_id.clone(),
                feature_id: feature_id.clone(),
                value: *value,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn paid_record() -> CustomerRecord {
        CustomerRecord::builder("cus-1", "ada@example.com", "Ada Lovelace")
            .billing_id("cus_stripe_1")
            .plan("plan-pro")
            .billing_period(BillingPeriod::Annually)
            .start_date(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap())
            .usage("feat-a", 3.0)
            .usage("feat-b", 5.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_provision_request_serializes_camel_case() {
        let request = ProvisionCustomerRequest::from_record(&paid_record());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["customerId"], "cus-1");
        assert_eq!(json["subscriptionParams"]["planId"], "plan-pro");
        assert_eq!(json["subscriptionParams"]["billingPeriod"], "ANNUALLY");
        assert_eq!(json["subscriptionParams"]["startDate"], "2022-01-01T00:00:00Z");
    }

    #[test]
    fn test_import_request_only_for_paid_customers() {
        let paid = paid_record();
        let request = ImportCustomerRequest::from_record(&paid).unwrap();
        assert_eq!(request.billing_id, "cus_stripe_1");

        let free = CustomerRecord::builder("cus-2", "b@example.com", "Bo").build().unwrap();
        assert!(ImportCustomerRequest::from_record(&free).is_none());
    }

    #[test]
    fn test_usage_requests_match_usage_map() {
        let requests = ReportUsageRequest::all_from_record(&paid_record());

        assert_eq!(requests.len(), 2);
        assert!(requests.iter().any(|r| r.feature_id == "feat-a" && r.value == 3.0));
        assert!(requests.iter().any(|r| r.feature_id == "feat-b" && r.value == 5.0));
        assert!(requests.iter().all(|r| r.customer_id == "cus-1"));
    }

    #[test]
    fn test_subscription_request_backdated_to_record_start() {
        let record = paid_record();
        let request = CreateSubscriptionRequest::from_record(&record);
        assert_eq!(request.start_date, record.subscription_start_date);
        assert_eq!(request.billing_period, BillingPeriod::Annually);
    }
}
