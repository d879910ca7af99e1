// * Billing backend seam
// * The importer only talks to this trait, so the HTTP client and test doubles
// * are interchangeable.

use crate::billing::errors::BillingError;
use crate::billing::types::{
    CreateSubscriptionRequest, ImportCustomerRequest, ProvisionCustomerRequest, ReportUsageRequest,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for async billing results
pub type BillingFuture<'a> = Pin<Box<dyn Future<Output = Result<(), BillingError>> + Send + 'a>>;

/// The four operations the importer needs from the billing platform
///
/// Implementations must be safe to call concurrently from many record
/// workflows at once.
pub trait BillingBackend: Send + Sync {
    /// Creates a customer together with its initial subscription
    fn provision_customer<'a>(&'a self, request: &'a ProvisionCustomerRequest) -> BillingFuture<'a>;

    /// Registers a customer that already has a payment-provider record
    fn import_customer<'a>(&'a self, request: &'a ImportCustomerRequest) -> BillingFuture<'a>;

    /// Creates a subscription, possibly starting in the past
    fn create_subscription<'a>(&'a self, request: &'a CreateSubscriptionRequest) -> BillingFuture<'a>;

    /// Records current usage of one feature
    fn report_usage<'a>(&'a self, request: &'a ReportUsageRequest) -> BillingFuture<'a>;
}

impl<T: BillingBackend + ?Sized> BillingBackend for Arc<T> {
    fn provision_customer<'a>(&'a self, request: &'a ProvisionCustomerRequest) -> BillingFuture<'a> {
        (**self).provision_customer(request)
    }

    fn import_customer<'a>(&'a self, request: &'a ImportCustomerRequest) -> BillingFuture<'a> {
        (**self).import_customer(request)
    }

    fn create_subscription<'a>(&'a self, request: &'a CreateSubscriptionRequest) -> BillingFuture<'a> {
        (**self).create_subscription(request)
    }

    fn report_usage<'a>(&'a self, request: &'a ReportUsageRequest) -> BillingFuture<'a> {
        (**self).report_usage(request)
    }
}
