// * Batch Importer: chunking, per-record workflows, throttling and the run summary

pub mod importer;
pub mod summary;
pub mod throttle;
pub mod workflow;

pub use importer::{chunk_count, ImportOptions, Importer};
pub use summary::{ImportSummary, RecordFailure};
pub use throttle::CallThrottle;
pub use workflow::{CallRunner, WorkflowKind};
