// * Runtime configuration, read from the process environment

use crate::config::constants::*;
use crate::records::{BillingPeriod, RecordError};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

/// What happens to a chunk (and the run) when one record's workflow fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the chunk's join on the first failure and abort the run
    #[default]
    AbortRun,
    /// Let every record settle, keep going, and report failures in the summary
    CollectAll,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" | "abort-run" | "fail-fast" => Ok(FailurePolicy::AbortRun),
            "collect" | "collect-all" | "continue" => Ok(FailurePolicy::CollectAll),
            other => Err(format!("expected 'abort' or 'collect', got '{}'", other)),
        }
    }
}

/// Values applied uniformly to every upstream user when it becomes a record
///
/// The upstream source carries identity only, so plan, cadence, start date and
/// usage come from here. Integrators replace these with their own policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDefaults {
    pub plan_id: String,
    pub billing_period: BillingPeriod,
    pub start_date: DateTime<Utc>,
    pub features_usage: BTreeMap<String, f64>,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        let mut features_usage = BTreeMap::new();
        features_usage.insert(DEFAULT_USAGE_FEATURE.to_string(), DEFAULT_USAGE_VALUE);

        Self {
            plan_id: DEFAULT_PLAN_ID.to_string(),
            billing_period: BillingPeriod::Monthly,
            start_date: DateTime::parse_from_rfc3339(DEFAULT_START_DATE)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_default(),
            features_usage,
        }
    }
}

/// Where the loader reads upstream users from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLocation {
    Http(Url),
    File(PathBuf),
}

/// Full configuration for one import run
#[derive(Debug)]
pub struct ImportConfig {
    pub api_key: SecretString,
    pub billing_api_url: Url,
    pub source: SourceLocation,
    pub chunk_size: usize,
    pub call_timeout: Duration,
    pub failure_policy: FailurePolicy,
    pub rate_limit_per_sec: Option<u32>,
    pub defaults: RecordDefaults,
    pub metrics_file: Option<PathBuf>,
}

impl ImportConfig {
    /// Reads the process environment (call [`load_dotenv`] first to honor `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(ENV_API_KEY)
            .map(SecretString::from)
            .ok_or(ConfigError::Missing(ENV_API_KEY))?;

        let billing_api_url = parse_url(
            ENV_API_URL,
            &get(ENV_API_URL).unwrap_or_else(|| DEFAULT_BILLING_API_URL.to_string()),
        )?;

        let source = match get(ENV_SOURCE_FILE) {
            Some(path) => SourceLocation::File(PathBuf::from(path)),
            None => SourceLocation::Http(parse_url(
                ENV_SOURCE_URL,
                &get(ENV_SOURCE_URL).unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            )?),
        };

        let chunk_size = match get(ENV_CHUNK_SIZE) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::invalid(ENV_CHUNK_SIZE, "must be a positive integer"))
                }
                Ok(n) => n,
            },
            None => CHUNK_SIZE,
        };

        let call_timeout_ms = match get(ENV_CALL_TIMEOUT_MS) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::invalid(
                        ENV_CALL_TIMEOUT_MS,
                        "must be a positive number of milliseconds",
                    ))
                }
                Ok(ms) => ms,
            },
            None => CALL_TIMEOUT_MS,
        };

        let failure_policy = match get(ENV_FAILURE_POLICY) {
            Some(raw) => raw
                .parse::<FailurePolicy>()
                .map_err(|e| ConfigError::invalid(ENV_FAILURE_POLICY, e))?,
            None => FailurePolicy::default(),
        };

        let rate_limit_per_sec = match get(ENV_RATE_LIMIT) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::invalid(ENV_RATE_LIMIT, "must be a positive integer"))
                }
                Ok(n) => Some(n),
            },
            None => None,
        };

        let defaults = Self::defaults_from(&get)?;

        Ok(Self {
            api_key,
            billing_api_url,
            source,
            chunk_size,
            call_timeout: Duration::from_millis(call_timeout_ms),
            failure_policy,
            rate_limit_per_sec,
            defaults,
            metrics_file: get(ENV_METRICS_FILE).map(PathBuf::from),
        })
    }

    fn defaults_from<G>(get: &G) -> Result<RecordDefaults, ConfigError>
    where
        G: Fn(&str) -> Option<String>,
    {
        let mut defaults = RecordDefaults::default();

        if let Some(plan_id) = get(ENV_PLAN_ID) {
            defaults.plan_id = plan_id.trim().to_string();
        }

        if let Some(raw) = get(ENV_BILLING_PERIOD) {
            defaults.billing_period = raw
                .parse()
                .map_err(|e: RecordError| ConfigError::invalid(ENV_BILLING_PERIOD, e.to_string()))?;
        }

        if let Some(raw) = get(ENV_START_DATE) {
            defaults.start_date = DateTime::parse_from_rfc3339(raw.trim())
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| ConfigError::invalid(ENV_START_DATE, e.to_string()))?;
        }

        if let Some(raw) = get(ENV_FEATURES_USAGE) {
            defaults.features_usage = parse_usage_map(&raw)
                .map_err(|e| ConfigError::invalid(ENV_FEATURES_USAGE, e))?;
        }

        Ok(defaults)
    }
}

/// Loads `.env` from the working directory or its parents, if present
///
/// Variables already set in the process environment win.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::invalid(key, e.to_string()))
}

/// Parses `feature-a=3,feature-b=5` into a usage map
pub fn parse_usage_map(raw: &str) -> Result<BTreeMap<String, f64>, String> {
    let mut usage = BTreeMap::new();

    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (feature, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("'{}' is not a feature=value pair", pair))?;

        let feature = feature.trim();
        if feature.is_empty() {
            return Err(format!("'{}' has an empty feature id", pair));
        }

        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("'{}' has a non-numeric value", pair))?;
        if !value.is_finite() || value < 0.0 {
            return Err(format!("'{}' must have a non-negative value", pair));
        }

        if usage.insert(feature.to_string(), value).is_some() {
            return Err(format!("feature '{}' is listed twice", feature));
        }
    }

    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_api_key_is_required() {
        let result = ImportConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::Missing(ENV_API_KEY))));
    }

    #[test]
    fn test_defaults_applied() {
        let config = ImportConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "sk-test")])).unwrap();

        assert_eq!(config.api_key.expose_secret(), "sk-test");
        assert_eq!(config.chunk_size, CHUNK_SIZE);
        assert_eq!(config.call_timeout, Duration::from_millis(CALL_TIMEOUT_MS));
        assert_eq!(config.failure_policy, FailurePolicy::AbortRun);
        assert_eq!(config.rate_limit_per_sec, None);
        assert_eq!(config.billing_api_url.as_str(), DEFAULT_BILLING_API_URL);
        assert!(matches!(config.source, SourceLocation::Http(ref u) if u.as_str() == DEFAULT_SOURCE_URL));
        assert_eq!(config.defaults, RecordDefaults::default());
        assert!(config.metrics_file.is_none());
    }

    #[test]
    fn test_api_key_not_leaked_in_debug() {
        let config = ImportConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "sk-very-secret")])).unwrap();
        assert!(!format!("{:?}", config).contains("sk-very-secret"));
    }

    #[test]
    fn test_source_file_overrides_url() {
        let config = ImportConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "k"),
            (ENV_SOURCE_URL, "https://example.com/users"),
            (ENV_SOURCE_FILE, "/tmp/users.json"),
        ]))
        .unwrap();

        assert_eq!(config.source, SourceLocation::File(PathBuf::from("/tmp/users.json")));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = ImportConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "k"), (ENV_CHUNK_SIZE, "0")]));
        assert!(matches!(result, Err(ConfigError::Invalid { key: ENV_CHUNK_SIZE, .. })));
    }

    #[test]
    fn test_failure_policy_parsing() {
        let config = ImportConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "k"),
            (ENV_FAILURE_POLICY, "collect"),
        ]))
        .unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::CollectAll);

        let result = ImportConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "k"),
            (ENV_FAILURE_POLICY, "sometimes"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { key: ENV_FAILURE_POLICY, .. })));
    }

    #[test]
    fn test_record_default_overrides() {
        let config = ImportConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "k"),
            (ENV_PLAN_ID, "plan-pro"),
            (ENV_BILLING_PERIOD, "annually"),
            (ENV_START_DATE, "2021-06-01T00:00:00Z"),
            (ENV_FEATURES_USAGE, "seats=4, projects=12"),
        ]))
        .unwrap();

        assert_eq!(config.defaults.plan_id, "plan-pro");
        assert_eq!(config.defaults.billing_period, BillingPeriod::Annually);
        assert_eq!(config.defaults.start_date.to_rfc3339(), "2021-06-01T00:00:00+00:00");
        assert_eq!(config.defaults.features_usage.len(), 2);
        assert_eq!(config.defaults.features_usage.get("projects"), Some(&12.0));
    }

    #[test]
    fn test_invalid_start_date_rejected() {
        let result = ImportConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "k"),
            (ENV_START_DATE, "yesterday"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { key: ENV_START_DATE, .. })));
    }

    #[test]
    fn test_default_record_policy() {
        let defaults = RecordDefaults::default();
        assert_eq!(defaults.plan_id, "plan-revvenu-basic");
        assert_eq!(defaults.billing_period, BillingPeriod::Monthly);
        assert_eq!(defaults.start_date.to_rfc3339(), "2022-01-01T00:00:00+00:00");
        assert_eq!(defaults.features_usage.get("feature-02-campaigns"), Some(&3.0));
    }

    #[test]
    fn test_parse_usage_map_errors() {
        assert!(parse_usage_map("seats").is_err());
        assert!(parse_usage_map("seats=lots").is_err());
        assert!(parse_usage_map("seats=-2").is_err());
        assert!(parse_usage_map("seats=1,seats=2").is_err());
        assert!(parse_usage_map("=1").is_err());
        assert!(parse_usage_map("").unwrap().is_empty());
    }
}
