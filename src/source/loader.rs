// * Record Loader
// * Fetches upstream users once per run and turns them into validated records

use crate::config::constants::SOURCE_TIMEOUT_MS;
use crate::errors::ImportError;
use crate::network::{JsonClient, NetworkError};
use crate::records::{CustomerRecord, RecordError};
use crate::source::mapping::CustomerMapper;
use crate::source::upstream::{PayloadError, UpstreamPayload, UpstreamUser};
use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("fetch failed: {0}")]
    Network(#[from] NetworkError),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("invalid record: {0}")]
    InvalidRecord(#[from] RecordError),

    #[error("customer id '{0}' appears more than once")]
    DuplicateCustomer(String),
}

/// Type alias for async load results
pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<CustomerRecord>, SourceError>> + Send + 'a>>;

/// Anything that can produce the full list of records for a run
pub trait RecordSource: Send + Sync {
    fn load(&self) -> SourceFuture<'_>;

    /// Human-readable origin, used in logs
    fn describe(&self) -> String;
}

/// Loads records from `source`, logging the failure before it propagates
pub async fn load_records(source: &dyn RecordSource) -> Result<Vec<CustomerRecord>, ImportError> {
    let origin = source.describe();
    tracing::info!(source = %origin, "Loading customer records");

    match source.load().await {
        Ok(records) => {
            tracing::info!(source = %origin, count = records.len(), "Loaded customer records");
            Ok(records)
        }
        Err(e) => {
            tracing::error!(source = %origin, error = %e, "Error while loading customer records");
            Err(ImportError::SourceUnavailable(e))
        }
    }
}

/// Validates and maps upstream users, preserving payload order
pub fn map_users(users: Vec<UpstreamUser>, mapper: &CustomerMapper) -> Result<Vec<CustomerRecord>, SourceError> {
    let records = users
        .into_iter()
        .enumerate()
        .map(|(index, user)| -> Result<CustomerRecord, SourceError> {
            let valid = user.validate(index)?;
            Ok(mapper.map(valid)?)
        })
        .collect::<Result<Vec<_>, SourceError>>()?;

    ensure_unique(&records)?;
    Ok(records)
}

fn ensure_unique(records: &[CustomerRecord]) -> Result<(), SourceError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.customer_id.as_str()) {
            return Err(SourceError::DuplicateCustomer(record.customer_id.clone()));
        }
    }
    Ok(())
}

/// Reads upstream users from an HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpRecordSource {
    client: JsonClient,
    url: Url,
    mapper: CustomerMapper,
}

impl HttpRecordSource {
    pub fn new(url: Url, mapper: CustomerMapper) -> Result<Self, SourceError> {
        let client = JsonClient::new(Duration::from_millis(SOURCE_TIMEOUT_MS), &[])?;
        Ok(Self { client, url, mapper })
    }

    async fn fetch(&self) -> Result<Vec<CustomerRecord>, SourceError> {
        let payload: UpstreamPayload = self.client.get_json(self.url.as_str()).await?;
        map_users(payload.into_users(), &self.mapper)
    }
}

impl RecordSource for HttpRecordSource {
    fn load(&self) -> SourceFuture<'_> {
        Box::pin(self.fetch())
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Reads upstream users from a local JSON file of the same shape
#[derive(Debug, Clone)]
pub struct FileRecordSource {
    path: PathBuf,
    mapper: CustomerMapper,
}

impl FileRecordSource {
    pub fn new(path: impl Into<PathBuf>, mapper: CustomerMapper) -> Self {
        Self {
            path: path.into(),
            mapper,
        }
    }

    async fn read(&self) -> Result<Vec<CustomerRecord>, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let payload: UpstreamPayload = serde_json::from_str(&raw)?;
        map_users(payload.into_users(), &self.mapper)
    }
}

impl RecordSource for FileRecordSource {
    fn load(&self) -> SourceFuture<'_> {
        Box::pin(self.read())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Records already built in code
#[derive(Debug, Clone, Default)]
pub struct StaticRecordSource {
    records: Vec<CustomerRecord>,
}

impl StaticRecordSource {
    pub fn new(records: Vec<CustomerRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for StaticRecordSource {
    fn load(&self) -> SourceFuture<'_> {
        let records = self.records.clone();
        Box::pin(async move {
            for record in &records {
                record.validate()?;
            }
            ensure_unique(&records)?;
            Ok(records)
        })
    }

    fn describe(&self) -> String {
        format!("static ({} records)", self.records.len())
    }
}
