// * Batch Importer
// * Chunks run one after another; records inside a chunk run concurrently.

use crate::billing::BillingBackend;
use crate::config::{FailurePolicy, ImportConfig};
use crate::config::constants::{CALL_TIMEOUT_MS, CHUNK_SIZE};
use crate::engine::summary::{ImportSummary, RecordFailure};
use crate::engine::throttle::CallThrottle;
use crate::engine::workflow::CallRunner;
use crate::errors::ImportError;
use crate::ops::telemetry;
use crate::records::CustomerRecord;
use futures::future::{join_all, try_join_all};
use std::time::Duration;
use tracing::{debug, error, info};

/// Knobs of the batch importer
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub chunk_size: usize,
    pub call_timeout: Duration,
    pub failure_policy: FailurePolicy,
    pub rate_limit_per_sec: Option<u32>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            call_timeout: Duration::from_millis(CALL_TIMEOUT_MS),
            failure_policy: FailurePolicy::default(),
            rate_limit_per_sec: None,
        }
    }
}

impl ImportOptions {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            call_timeout: config.call_timeout,
            failure_policy: config.failure_policy,
            rate_limit_per_sec: config.rate_limit_per_sec,
        }
    }
}

/// Number of chunks `total` records split into
pub fn chunk_count(total: usize, chunk_size: usize) -> usize {
    let chunk_size = chunk_size.max(1);
    (total + chunk_size - 1) / chunk_size
}

/// Drives every record through its workflow against an injected backend
pub struct Importer<'a> {
    backend: &'a dyn BillingBackend,
    options: ImportOptions,
    throttle: CallThrottle,
}

impl<'a> Importer<'a> {
    pub fn new(backend: &'a dyn BillingBackend, options: ImportOptions) -> Self {
        let throttle = CallThrottle::from_option(options.rate_limit_per_sec);
        Self {
            backend,
            options,
            throttle,
        }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Imports all records, chunk by chunk
    ///
    /// With [`FailurePolicy::AbortRun`] the first failing record cancels the
    /// rest of its chunk and the error is returned. With
    /// [`FailurePolicy::CollectAll`] every record settles and failures are
    /// listed in the summary.
    pub async fn import_all(&self, records: &[CustomerRecord]) -> Result<ImportSummary, ImportError> {
        let chunk_size = self.options.chunk_size.max(1);
        let chunks = chunk_count(records.len(), chunk_size);
        let runner = CallRunner::new(self.backend, &self.throttle, self.options.call_timeout);
        let mut summary = ImportSummary::new(records.len());

        info!(
            total = records.len(),
            chunk_size,
            chunks,
            policy = ?self.options.failure_policy,
            "Starting customer import"
        );

        for (index, chunk) in records.chunks(chunk_size).enumerate() {
            let chunk_no = index + 1;
            debug!(chunk = chunk_no, size = chunk.len(), "Importing chunk");

            match self.options.failure_policy {
                FailurePolicy::AbortRun => {
                    match try_join_all(chunk.iter().map(|record| runner.import_record(record))).await {
                        Ok(kinds) => {
                            for kind in kinds {
                                summary.record_success(kind);
                            }
                        }
                        Err(e) => {
                            telemetry::record_chunk(false);
                            error!(
                                chunk = chunk_no,
                                customer_id = e.customer_id().unwrap_or_default(),
                                error = %e,
                                "Aborting import after record failure"
                            );
                            return Err(e);
                        }
                    }
                }
                FailurePolicy::CollectAll => {
                    let results = join_all(chunk.iter().map(|record| runner.import_record(record))).await;
                    for (record, result) in chunk.iter().zip(results) {
                        match result {
                            Ok(kind) => summary.record_success(kind),
                            Err(e) => {
                                error!(
                                    chunk = chunk_no,
                                    customer_id = %record.customer_id,
                                    error = %e,
                                    "Customer import failed"
                                );
                                summary.failures.push(RecordFailure {
                                    customer_id: record.customer_id.clone(),
                                    error: e,
                                });
                            }
                        }
                    }
                }
            }

            summary.chunks += 1;
            telemetry::record_chunk(true);
            info!(chunk = chunk_no, of = chunks, "Chunk settled");
        }

        info!(
            total = summary.total,
            provisioned = summary.provisioned,
            imported = summary.imported,
            failed = summary.failures.len(),
            "{}",
            summary
        );

        Ok(summary)
    }
}
