// * Per-record import workflow
// * Free customers: provision (customer + subscription in one call).
// * Paid customers: import, then backdate a subscription.
// * Both: report every usage entry concurrently once the subscription exists.

use crate::billing::{
    BillingBackend, BillingError, BillingFuture, BillingOperation, CreateSubscriptionRequest,
    ImportCustomerRequest, ProvisionCustomerRequest, ReportUsageRequest,
};
use crate::engine::throttle::CallThrottle;
use crate::errors::ImportError;
use crate::ops::telemetry;
use crate::records::CustomerRecord;
use futures::future::join_all;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which branch a record went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    Provision,
    Import,
}

impl WorkflowKind {
    pub fn of(record: &CustomerRecord) -> Self {
        if record.is_paid() {
            WorkflowKind::Import
        } else {
            WorkflowKind::Provision
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowKind::Provision => "provision",
            WorkflowKind::Import => "import",
        }
    }
}

/// Issues billing calls with the run's timeout, throttle and metrics applied
pub struct CallRunner<'a> {
    backend: &'a dyn BillingBackend,
    throttle: &'a CallThrottle,
    timeout: Duration,
}

impl<'a> CallRunner<'a> {
    pub fn new(backend: &'a dyn BillingBackend, throttle: &'a CallThrottle, timeout: Duration) -> Self {
        Self {
            backend,
            throttle,
            timeout,
        }
    }

    // * `call` is only polled after the throttle admits it
    async fn run(&self, operation: BillingOperation, call: BillingFuture<'_>) -> Result<(), BillingError> {
        self.throttle.until_ready().await;

        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(BillingError::Timeout(self.timeout.as_millis() as u64)),
        };

        let elapsed = start.elapsed().as_secs_f64();
        telemetry::record_billing_call(operation, result.is_ok(), elapsed);
        debug!(operation = %operation, elapsed_secs = elapsed, ok = result.is_ok(), "Billing call settled");

        result
    }

    /// Runs the full workflow for one record
    pub async fn import_record(&self, record: &CustomerRecord) -> Result<WorkflowKind, ImportError> {
        let kind = WorkflowKind::of(record);
        let result = self.establish_subscription(record).await;
        let result = match result {
            Ok(()) => self.report_usage(record).await,
            Err(e) => Err(e),
        };

        telemetry::record_record_outcome(kind.as_str(), result.is_ok());
        result.map(|_| kind)
    }

    async fn establish_subscription(&self, record: &CustomerRecord) -> Result<(), ImportError> {
        let customer_id = record.customer_id.as_str();

        match ImportCustomerRequest::from_record(record) {
            None => {
                info!(customer_id, "Provisioning free customer");
                let request = ProvisionCustomerRequest::from_record(record);
                self.run(
                    BillingOperation::ProvisionCustomer,
                    self.backend.provision_customer(&request),
                )
                .await
                .map_err(|source| ImportError::ProvisionFailed {
                    customer_id: customer_id.to_string(),
                    source,
                })
            }
            Some(import) => {
                info!(customer_id, "Importing paid customer");
                self.run(BillingOperation::ImportCustomer, self.backend.import_customer(&import))
                    .await
                    .map_err(|source| ImportError::ImportFailed {
                        customer_id: customer_id.to_string(),
                        source,
                    })?;

                info!(
                    customer_id,
                    start_date = %record.subscription_start_date,
                    "Backdating paid customer subscription"
                );
                let subscription = CreateSubscriptionRequest::from_record(record);
                self.run(
                    BillingOperation::CreateSubscription,
                    self.backend.create_subscription(&subscription),
                )
                .await
                .map_err(|source| ImportError::SubscriptionCreateFailed {
                    customer_id: customer_id.to_string(),
                    source,
                })
            }
        }
    }

    // * Every entry is attempted; the first failure (in feature order) is returned
    async fn report_usage(&self, record: &CustomerRecord) -> Result<(), ImportError> {
        let requests = ReportUsageRequest::all_from_record(record);
        info!(
            customer_id = %record.customer_id,
            features = requests.len(),
            "Updating customer feature current usage"
        );

        let results = join_all(requests.iter().map(|request| async move {
            let result = self
                .run(BillingOperation::ReportUsage, self.backend.report_usage(request))
                .await;
            (request, result)
        }))
        .await;

        let mut first_error = None;
        for (request, result) in results {
            if let Err(source) = result {
                warn!(
                    customer_id = %request.customer_id,
                    feature_id = %request.feature_id,
                    error = %source,
                    "Usage report failed"
                );
                if first_error.is_none() {
                    first_error = Some(ImportError::UsageReportFailed {
                        customer_id: request.customer_id.clone(),
                        feature_id: request.feature_id.clone(),
                        source,
                    });
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
