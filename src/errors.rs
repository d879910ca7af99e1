// * Run-level error taxonomy

use crate::billing::BillingError;
use crate::config::ConfigError;
use crate::source::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Customer source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    #[error("Failed to provision customer {customer_id}: {source}")]
    ProvisionFailed {
        customer_id: String,
        #[source]
        source: BillingError,
    },

    #[error("Failed to import customer {customer_id}: {source}")]
    ImportFailed {
        customer_id: String,
        #[source]
        source: BillingError,
    },

    #[error("Failed to create subscription for customer {customer_id}: {source}")]
    SubscriptionCreateFailed {
        customer_id: String,
        #[source]
        source: BillingError,
    },

    #[error("Failed to report usage of '{feature_id}' for customer {customer_id}: {source}")]
    UsageReportFailed {
        customer_id: String,
        feature_id: String,
        #[source]
        source: BillingError,
    },

    #[error("Billing client setup failed: {0}")]
    BillingSetup(#[source] BillingError),

    #[error("Import interrupted: {0}")]
    Interrupted(String),
}

impl ImportError {
    /// Customer whose workflow produced this error, if any
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            ImportError::ProvisionFailed { customer_id, .. }
            | ImportError::ImportFailed { customer_id, .. }
            | ImportError::SubscriptionCreateFailed { customer_id, .. }
            | ImportError::UsageReportFailed { customer_id, .. } => Some(customer_id),
            _ => None,
        }
    }

    pub fn is_record_failure(&self) -> bool {
        self.customer_id().is_some()
    }
}
