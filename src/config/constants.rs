// * Configuration Constants
// * Central location for batch sizes, timeouts and endpoint defaults

// * Records per concurrency unit
pub const CHUNK_SIZE: usize = 20;

// * Per-call timeout applied to every billing operation
pub const CALL_TIMEOUT_MS: u64 = 30_000;

// * Timeout for the single upstream fetch
pub const SOURCE_TIMEOUT_MS: u64 = 60_000;

// * Upstream users endpoint (dummy data API)
pub const DEFAULT_SOURCE_URL: &str = "https://random-data-api.com/api/v2/users?size=100";

// * Billing GraphQL endpoint
pub const DEFAULT_BILLING_API_URL: &str = "https://api.stigg.io/graphql";

pub const USER_AGENT: &str = concat!("customer-import/", env!("CARGO_PKG_VERSION"));

// * Placeholder record defaults, meant to be replaced by integrators
pub const DEFAULT_PLAN_ID: &str = "plan-revvenu-basic";
pub const DEFAULT_START_DATE: &str = "2022-01-01T00:00:00Z";
pub const DEFAULT_USAGE_FEATURE: &str = "feature-02-campaigns";
pub const DEFAULT_USAGE_VALUE: f64 = 3.0;

// * Environment variable names
pub const ENV_API_KEY: &str = "STIGG_SERVER_API_KEY";
pub const ENV_API_URL: &str = "STIGG_API_URL";
pub const ENV_SOURCE_URL: &str = "CUSTOMER_SOURCE_URL";
pub const ENV_SOURCE_FILE: &str = "CUSTOMER_SOURCE_FILE";
pub const ENV_CHUNK_SIZE: &str = "IMPORT_CHUNK_SIZE";
pub const ENV_CALL_TIMEOUT_MS: &str = "IMPORT_CALL_TIMEOUT_MS";
pub const ENV_FAILURE_POLICY: &str = "IMPORT_FAILURE_POLICY";
pub const ENV_RATE_LIMIT: &str = "IMPORT_RATE_LIMIT_PER_SEC";
pub const ENV_PLAN_ID: &str = "IMPORT_PLAN_ID";
pub const ENV_BILLING_PERIOD: &str = "IMPORT_BILLING_PERIOD";
pub const ENV_START_DATE: &str = "IMPORT_START_DATE";
pub const ENV_FEATURES_USAGE: &str = "IMPORT_FEATURES_USAGE";
pub const ENV_METRICS_FILE: &str = "IMPORT_METRICS_FILE";
