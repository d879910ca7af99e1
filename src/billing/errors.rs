use crate::network::NetworkError;
use thiserror::Error;

// * Failures of a single billing-backend call.
#[derive(Error, Debug)]
pub enum BillingError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("billing API returned errors: {}", .0.join("; "))]
    Api(Vec<String>),

    #[error("billing API returned no data for {0}")]
    EmptyResponse(&'static str),

    #[error("billing call timed out after {0}ms")]
    Timeout(u64),

    #[error("billing call rejected: {0}")]
    Rejected(String),
}
