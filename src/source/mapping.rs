// * Upstream user -> CustomerRecord transformation

use crate::config::RecordDefaults;
use crate::records::{CustomerRecord, RecordError};
use crate::source::upstream::ValidUser;

/// Applies the integrator's record defaults to validated upstream users
#[derive(Debug, Clone, Default)]
pub struct CustomerMapper {
    defaults: RecordDefaults,
}

impl CustomerMapper {
    pub fn new(defaults: RecordDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &RecordDefaults {
        &self.defaults
    }

    /// Upstream users never carry a payment-provider id, so every mapped
    /// record goes through the free workflow
    pub fn map(&self, user: ValidUser) -> Result<CustomerRecord, RecordError> {
        let name = user.full_name();
        CustomerRecord::builder(user.uid, user.email, name)
            .plan(self.defaults.plan_id.clone())
            .billing_period(self.defaults.billing_period)
            .start_date(self.defaults.start_date)
            .features_usage(self.defaults.features_usage.clone())
            .build()
    }
}
