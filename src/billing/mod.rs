// * Billing platform access: the backend trait, its HTTP implementation and
// * an in-memory double

pub mod backend;
pub mod errors;
pub mod http;
pub mod memory;
pub mod types;

pub use backend::{BillingBackend, BillingFuture};
pub use errors::BillingError;
pub use http::{BillingClientConfig, HttpBillingClient};
pub use memory::{InMemoryBillingBackend, RecordedCall};
pub use types::{
    BillingOperation, CreateSubscriptionRequest, ImportCustomerRequest, ProvisionCustomerRequest,
    ReportUsageRequest, SubscriptionParams,
};
