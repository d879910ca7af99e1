//! Customer Import
//!
//! One-shot batch import of customer records into a billing/entitlements
//! platform:
//! - load customer records from an upstream source (HTTP, file or in-memory)
//! - provision free customers, or import paid customers and backdate their
//!   subscription
//! - report current feature usage
//!
//! Records are processed in fixed-size chunks: chunks run one after another,
//! records inside a chunk run concurrently.

pub mod billing;
pub mod config;
pub mod engine;
pub mod errors;
pub mod network;
pub mod ops;
pub mod records;
pub mod source;

pub use billing::{BillingBackend, BillingClientConfig, HttpBillingClient, InMemoryBillingBackend};
pub use config::{FailurePolicy, ImportConfig, RecordDefaults};
pub use engine::{ImportOptions, ImportSummary, Importer};
pub use errors::ImportError;
pub use records::{BillingPeriod, CustomerRecord};
pub use source::{load_records, RecordSource};

use config::SourceLocation;
use secrecy::{ExposeSecret, SecretString};
use source::{CustomerMapper, FileRecordSource, HttpRecordSource};

/// Loads every record from `source`, then imports them into `backend`
///
/// No billing call is made unless the load succeeds.
pub async fn import_from(
    source: &dyn RecordSource,
    backend: &dyn BillingBackend,
    options: ImportOptions,
) -> Result<ImportSummary, ImportError> {
    let records = load_records(source).await?;
    Importer::new(backend, options).import_all(&records).await
}

/// Builds the record source named by the configuration
pub fn build_source(config: &ImportConfig) -> Result<Box<dyn RecordSource>, ImportError> {
    let mapper = CustomerMapper::new(config.defaults.clone());
    let source: Box<dyn RecordSource> = match &config.source {
        SourceLocation::Http(url) => Box::new(HttpRecordSource::new(url.clone(), mapper)?),
        SourceLocation::File(path) => Box::new(FileRecordSource::new(path.clone(), mapper)),
    };
    Ok(source)
}

/// Full run driven by configuration
///
/// The billing client is only initialized after the records are loaded.
pub async fn run(config: &ImportConfig) -> Result<ImportSummary, ImportError> {
    let source = build_source(config)?;
    let records = load_records(source.as_ref()).await?;

    let client = HttpBillingClient::initialize(BillingClientConfig {
        api_key: SecretString::from(config.api_key.expose_secret().to_string()),
        api_url: config.billing_api_url.clone(),
        timeout: config.call_timeout,
        realtime_updates_enabled: false,
    })
    .map_err(ImportError::BillingSetup)?;

    Importer::new(&client, ImportOptions::from_config(config))
        .import_all(&records)
        .await
}
