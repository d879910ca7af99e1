// * Canonical customer record consumed by the importer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("customer id must not be empty")]
    EmptyCustomerId,

    #[error("customer {customer_id}: feature id must not be empty")]
    EmptyFeatureId { customer_id: String },

    #[error("customer {customer_id}: usage for '{feature_id}' must be a non-negative number, got {value}")]
    InvalidUsage {
        customer_id: String,
        feature_id: String,
        value: f64,
    },

    #[error("unknown billing period '{0}' (expected MONTHLY or ANNUALLY)")]
    UnknownBillingPeriod(String),
}

/// Billing cadence of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingPeriod {
    Monthly,
    Annually,
}

impl BillingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "MONTHLY",
            BillingPeriod::Annually => "ANNUALLY",
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingPeriod {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MONTHLY" => Ok(BillingPeriod::Monthly),
            "ANNUALLY" => Ok(BillingPeriod::Annually),
            _ => Err(RecordError::UnknownBillingPeriod(s.to_string())),
        }
    }
}

/// One customer to push into the billing platform
///
/// # Fields
/// - `customer_id`: Stable external identifier, unique within a run
/// - `billing_id`: Reference to an existing payment-provider customer. Its
///   presence routes the record through the paid (import + backdate) workflow
/// - `features_usage`: Feature id to current usage, reported after the
///   subscription exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub email: String,
    pub name: String,
    pub billing_id: Option<String>,
    pub subscription_plan_id: String,
    pub subscription_start_date: DateTime<Utc>,
    pub subscription_billing_period: BillingPeriod,
    pub features_usage: BTreeMap<String, f64>,
}

impl CustomerRecord {
    /// Starts a builder with the identity fields; subscription fields default
    /// to a monthly plan starting now with no usage
    pub fn builder(
        customer_id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> CustomerRecordBuilder {
        CustomerRecordBuilder::new(customer_id, email, name)
    }

    /// True when the customer already exists in the payment provider
    pub fn is_paid(&self) -> bool {
        self.billing_id.is_some()
    }

    /// Checks the per-record invariants
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.customer_id.trim().is_empty() {
            return Err(RecordError::EmptyCustomerId);
        }

        for (feature_id, value) in &self.features_usage {
            if feature_id.trim().is_empty() {
                return Err(RecordError::EmptyFeatureId {
                    customer_id: self.customer_id.clone(),
                });
            }
            if !value.is_finite() || *value < 0.0 {
                return Err(RecordError::InvalidUsage {
                    customer_id: self.customer_id.clone(),
                    feature_id: feature_id.clone(),
                    value: *value,
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CustomerRecordBuilder {
    record: CustomerRecord,
}

impl CustomerRecordBuilder {
    pub fn new(
        customer_id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            record: CustomerRecord {
                customer_id: customer_id.into(),
                email: email.into(),
                name: name.into(),
                billing_id: None,
                subscription_plan_id: String::new(),
                subscription_start_date: Utc::now(),
                subscription_billing_period: BillingPeriod::Monthly,
                features_usage: BTreeMap::new(),
            },
        }
    }

    pub fn billing_id(mut self, billing_id: impl Into<String>) -> Self {
        self.record.billing_id = Some(billing_id.into());
        self
    }

    pub fn plan(mut self, plan_id: impl Into<String>) -> Self {
        self.record.subscription_plan_id = plan_id.into();
        self
    }

    pub fn start_date(mut self, start: DateTime<Utc>) -> Self {
        self.record.subscription_start_date = start;
        self
    }

    pub fn billing_period(mut self, period: BillingPeriod) -> Self {
        self.record.subscription_billing_period = period;
        self
    }

    pub fn usage(mut self, feature_id: impl Into<String>, value: f64) -> Self {
        self.record.features_usage.insert(feature_id.into(), value);
        self
    }

    pub fn features_usage(mut self, usage: BTreeMap<String, f64>) -> Self {
        self.record.features_usage = usage;
        self
    }

    /// Builds the record, rejecting it if an invariant does not hold
    pub fn build(self) -> Result<CustomerRecord, RecordError> {
        self.record.validate()?;
        Ok(self.record)
    }
}
