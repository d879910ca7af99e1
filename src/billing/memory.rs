// * In-memory billing backend for tests and dry runs
// * Records every call, can fail chosen calls and can add latency so that
// * concurrency is observable.

use crate::billing::backend::{BillingBackend, BillingFuture};
use crate::billing::errors::BillingError;
use crate::billing::types::{
    BillingOperation, CreateSubscriptionRequest, ImportCustomerRequest, ProvisionCustomerRequest,
    ReportUsageRequest,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One settled call as seen by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: BillingOperation,
    pub customer_id: String,
    pub feature_id: Option<String>,
    pub value: Option<f64>,
    /// Logical clock value when the call started
    pub started: u64,
    /// Logical clock value when the call settled
    pub finished: u64,
    pub succeeded: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryBillingBackend {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<HashSet<(BillingOperation, String)>>,
    latency: Option<Duration>,
    clock: AtomicU64,
    started_count: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryBillingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `latency` before settling
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Makes `operation` fail for `customer_id`
    pub fn fail_on(&self, operation: BillingOperation, customer_id: impl Into<String>) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((operation, customer_id.into()));
    }

    /// Settled calls in completion order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls_for(&self, customer_id: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.customer_id == customer_id)
            .collect()
    }

    pub fn count(&self, operation: BillingOperation) -> usize {
        self.calls().iter().filter(|c| c.operation == operation).count()
    }

    /// Calls that started, including ones dropped before settling
    pub fn started_count(&self) -> usize {
        self.started_count.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn handle(
        &self,
        operation: BillingOperation,
        customer_id: &str,
        usage: Option<(&str, f64)>,
    ) -> Result<(), BillingError> {
        let started = self.clock.fetch_add(1, Ordering::SeqCst);
        self.started_count.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let guard = InFlightGuard(&self.in_flight);

        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }

        let should_fail = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&(operation, customer_id.to_string()));

        drop(guard);
        let finished = self.clock.fetch_add(1, Ordering::SeqCst);

        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                operation,
                customer_id: customer_id.to_string(),
                feature_id: usage.map(|(feature, _)| feature.to_string()),
                value: usage.map(|(_, value)| value),
                started,
                finished,
                succeeded: !should_fail,
            });

        if should_fail {
            return Err(BillingError::Rejected(format!(
                "{} failed for {}",
                operation, customer_id
            )));
        }

        Ok(())
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl BillingBackend for InMemoryBillingBackend {
    fn provision_customer<'a>(&'a self, request: &'a ProvisionCustomerRequest) -> BillingFuture<'a> {
        Box::pin(self.handle(BillingOperation::ProvisionCustomer, &request.customer_id, None))
    }

    fn import_customer<'a>(&'a self, request: &'a ImportCustomerRequest) -> BillingFuture<'a> {
        Box::pin(self.handle(BillingOperation::ImportCustomer, &request.customer_id, None))
    }

    fn create_subscription<'a>(&'a self, request: &'a CreateSubscriptionRequest) -> BillingFuture<'a> {
        Box::pin(self.handle(BillingOperation::CreateSubscription, &request.customer_id, None))
    }

    fn report_usage<'a>(&'a self, request: &'a ReportUsageRequest) -> BillingFuture<'a> {
        Box::pin(self.handle(
            BillingOperation::ReportUsage,
            &request.customer_id,
            Some((request.feature_id.as_str(), request.value)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(customer_id: &str, feature_id: &str, value: f64) -> ReportUsageRequest {
        ReportUsageRequest {
            customer_id: customer_id.to_string(),
            feature_id: feature_id.to_string(),
            value,
        }
    }

    #[tokio::test]
    async fn test_calls_are_recorded() {
        let backend = InMemoryBillingBackend::new();
        backend.report_usage(&usage("cus-1", "seats", 2.0)).await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation, BillingOperation::ReportUsage);
        assert_eq!(calls[0].feature_id.as_deref(), Some("seats"));
        assert_eq!(calls[0].value, Some(2.0));
        assert!(calls[0].started < calls[0].finished);
        assert!(calls[0].succeeded);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let backend = InMemoryBillingBackend::new();
        backend.fail_on(BillingOperation::ReportUsage, "cus-1");

        let result = backend.report_usage(&usage("cus-1", "seats", 2.0)).await;
        assert!(matches!(result, Err(BillingError::Rejected(_))));

        // * Other customers are unaffected
        backend.report_usage(&usage("cus-2", "seats", 2.0)).await.unwrap();
        assert_eq!(backend.calls_for("cus-2").len(), 1);
        assert!(!backend.calls_for("cus-1")[0].succeeded);
    }

    #[tokio::test]
    async fn test_in_flight_tracking() {
        let backend = InMemoryBillingBackend::with_latency(Duration::from_millis(20));
        let a = usage("cus-1", "seats", 1.0);
        let b = usage("cus-2", "seats", 1.0);

        let (ra, rb) = tokio::join!(backend.report_usage(&a), backend.report_usage(&b));
        ra.unwrap();
        rb.unwrap();

        assert_eq!(backend.max_in_flight(), 2);
        assert_eq!(backend.started_count(), 2);
    }
}
