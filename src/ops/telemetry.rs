// * Telemetry - JSON Logging and Prometheus Metrics
// * A batch run has no scrape endpoint, so metrics can be dumped to a
// * text-format file when the run ends.

use crate::billing::BillingOperation;
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// * Filter used when RUST_LOG is not set
const DEFAULT_LOG_FILTER: &str = "customer_import=info,info";

lazy_static! {
    // * Records by workflow (provision/import) and outcome
    pub static ref RECORDS_TOTAL: CounterVec = register_counter_vec!(
        "customer_import_records_total",
        "Customer records processed by workflow and outcome",
        &["workflow", "outcome"]
    ).unwrap();

    // * Billing calls by operation and status
    pub static ref BILLING_CALLS_TOTAL: CounterVec = register_counter_vec!(
        "customer_import_billing_calls_total",
        "Billing backend calls by operation and status",
        &["operation", "status"]
    ).unwrap();

    // * Billing call latency
    pub static ref BILLING_CALL_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "customer_import_billing_call_duration_seconds",
        "Billing backend call duration in seconds",
        &["operation"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // * Chunks that fully settled
    pub static ref CHUNKS_TOTAL: CounterVec = register_counter_vec!(
        "customer_import_chunks_total",
        "Chunks processed by outcome",
        &["outcome"]
    ).unwrap();
}

/// Initializes the tracing subscriber with JSON formatting
///
/// # Example
/// ```ignore
/// use customer_import::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(customer_id = "cus-1", "Provisioning free customer");
/// ```
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_target(false))
        .init();
}

/// Records one settled billing call
pub fn record_billing_call(operation: BillingOperation, success: bool, seconds: f64) {
    let status = if success { "success" } else { "failure" };
    BILLING_CALLS_TOTAL
        .with_label_values(&[operation.as_str(), status])
        .inc();
    BILLING_CALL_DURATION_SECONDS
        .with_label_values(&[operation.as_str()])
        .observe(seconds);
}

/// Records a settled record workflow
pub fn record_record_outcome(workflow: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    RECORDS_TOTAL.with_label_values(&[workflow, outcome]).inc();
}

/// Records a settled chunk
pub fn record_chunk(success: bool) {
    let outcome = if success { "settled" } else { "aborted" };
    CHUNKS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Returns the current metrics in Prometheus text format
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Writes the current metrics to `path` (node-exporter textfile style)
pub async fn write_metrics_file(path: &Path) -> std::io::Result<()> {
    tokio::fs::write(path, get_metrics_string()).await?;
    tracing::info!(path = %path.display(), "Metrics written");
    Ok(())
}
