// * Client-side rate limit for billing calls
// * Shared by every concurrent record workflow of a run

use governor::{Quota, RateLimiter as GovernorLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;

type DirectLimiter = GovernorLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

// * CallThrottle holds at most one limiter; without one, calls pass straight through
#[derive(Default)]
pub struct CallThrottle {
    limiter: Option<DirectLimiter>,
}

impl std::fmt::Debug for CallThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallThrottle")
            .field("limited", &self.is_limited())
            .finish()
    }
}

impl CallThrottle {
    // * No limit
    pub fn unlimited() -> Self {
        Self { limiter: None }
    }

    // * Allows `calls_per_second` billing calls per second; bursts up to the same size
    pub fn per_second(calls_per_second: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(calls_per_second).unwrap_or(nonzero!(1u32)));
        Self {
            limiter: Some(GovernorLimiter::direct(quota)),
        }
    }

    pub fn from_option(calls_per_second: Option<u32>) -> Self {
        match calls_per_second {
            Some(n) => Self::per_second(n),
            None => Self::unlimited(),
        }
    }

    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }

    // * Waits until the next call is allowed
    pub async fn until_ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}
