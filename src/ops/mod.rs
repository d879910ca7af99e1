// * Operations: structured logging and run metrics

pub mod telemetry;

pub use telemetry::{
    get_metrics_string, init_tracing, record_billing_call, record_chunk, record_record_outcome,
    write_metrics_file,
};
